use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use altslave_device::{ConnectionId, DeviceError, DeviceRegistry, SlaveDevice};
use altslave_frame::MessageSnapshot;
use altslave_transport::SimBus;
use bytes::Bytes;
use tracing::{info, warn};

use crate::cmd::{parse_duration, resolve_config, WatchArgs};
use crate::exit::{device_error, io_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_readout, OutputFormat, Readout};
use crate::script;

pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let config = resolve_config(&args.device)?;
    let steps = script::load(&args.script)?;

    let bus = Arc::new(SimBus::new(args.device.bus.as_str()));
    let registry = DeviceRegistry::new();
    let device = registry
        .attach(&bus, config)
        .map_err(|err| device_error("attach failed", err))?;
    let address = device.address();
    let connection = ConnectionId::new(bus.name(), address).to_string();

    let running = Arc::new(AtomicBool::new(true));
    if let Err(err) = install_ctrlc_handler(running.clone()) {
        detach_quietly(&registry, &bus, &device);
        return Err(err);
    }

    let spawned = {
        let bus = Arc::clone(&bus);
        let running = Arc::clone(&running);
        thread::Builder::new()
            .name("bus-master".to_string())
            .spawn(move || {
                while running.load(Ordering::SeqCst) {
                    if let Err(err) = script::run(&bus, address, &steps) {
                        warn!(%err, "bus master stopped");
                        break;
                    }
                    thread::sleep(interval);
                }
            })
    };
    let master = match spawned {
        Ok(master) => master,
        Err(err) => {
            detach_quietly(&registry, &bus, &device);
            return Err(io_error("failed to start bus master", err));
        }
    };

    info!(%connection, ?interval, "watching device");
    let watched = watch_device(&device, &connection, &args, interval, format, &running);

    running.store(false, Ordering::SeqCst);
    let joined = master
        .join()
        .map_err(|_| CliError::new(INTERNAL, "bus master thread panicked"));
    let detached = registry
        .detach(&bus, address)
        .map_err(|err| device_error("detach failed", err));

    watched?;
    joined?;
    detached?;
    Ok(SUCCESS)
}

/// Print read-outs until `--count` is reached, ctrl-c clears `running`, or a
/// wait fails.
fn watch_device(
    device: &SlaveDevice,
    connection: &str,
    args: &WatchArgs,
    interval: Duration,
    format: OutputFormat,
    running: &AtomicBool,
) -> CliResult<()> {
    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let Some((data, snapshot)) = capture(device, args.sessions, interval, args.len)
            .map_err(|err| device_error("wait failed", err))?
        else {
            continue;
        };

        print_readout(
            &Readout {
                connection,
                device,
                data: &data,
                snapshot,
            },
            format,
        );
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }
    Ok(())
}

/// Take one read-out.
///
/// In session mode both the bytes and the snapshot come from the completed
/// session `wait_message` returned; `None` means no session ended within
/// `interval`. Otherwise this sleeps for `interval` and reads the live store.
fn capture(
    device: &SlaveDevice,
    sessions: bool,
    interval: Duration,
    len: usize,
) -> Result<Option<(Bytes, MessageSnapshot)>, DeviceError> {
    if sessions {
        return match device.wait_message(Some(interval)) {
            Ok(snapshot) => {
                let bytes = snapshot.to_bytes();
                Ok(Some((bytes.slice(..len.min(bytes.len())), snapshot)))
            }
            Err(DeviceError::Timeout(_)) => Ok(None),
            Err(err) => Err(err),
        };
    }

    thread::sleep(interval);
    Ok(Some((device.read(len), device.reader().snapshot())))
}

fn detach_quietly(registry: &DeviceRegistry, bus: &SimBus, device: &SlaveDevice) {
    if let Err(err) = registry.detach(bus, device.address()) {
        warn!(%err, "detach failed");
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
