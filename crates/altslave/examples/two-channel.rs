//! Two-channel example: a simulated master writes a CPU and a DDR message,
//! then a reader copies the store out.
//!
//! Run with:
//!   cargo run --example two-channel

use std::thread;
use std::time::Duration;

use altslave::device::{DeviceConfig, DeviceRegistry};
use altslave::frame::{Channel, CHANNEL_A, CHANNEL_B, STORE_LEN};
use altslave::transport::SimBus;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bus = SimBus::new("i2c-0");
    let registry = DeviceRegistry::new();
    let device = registry.attach(&bus, DeviceConfig::default())?;
    let address = device.address();

    let waiter = {
        let device = device.clone();
        thread::spawn(move || device.wait_message(Some(Duration::from_secs(2))))
    };
    thread::sleep(Duration::from_millis(50));

    let mut cpu = vec![CHANNEL_A];
    cpu.extend_from_slice(b"cpu temp 42C\0\0\0\0");
    cpu.extend_from_slice(&[0x10, 0x00]);
    bus.write(address, &cpu)?;

    let snap = waiter.join().map_err(|_| "waiter panicked")??;
    eprintln!("[reader] CPU: {:02x?}", snap.channel(Channel::A));

    bus.write(address, &[CHANNEL_B, 0xd1, 0xd2, 0xd3])?;
    let out = device.read(STORE_LEN);
    eprintln!("[reader] DDR: {:02x?}", &out[Channel::B.offset()..]);

    registry.detach(&bus, address)?;
    Ok(())
}
