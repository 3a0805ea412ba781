use altslave_device::{ConnectionId, DeviceRegistry};
use altslave_transport::SimBus;
use tracing::info;

use crate::cmd::{resolve_config, ReplayArgs};
use crate::exit::{device_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_readout, OutputFormat, Readout};
use crate::script;

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let config = resolve_config(&args.device)?;
    let steps = script::load(&args.script)?;

    let bus = SimBus::new(args.device.bus.as_str());
    let registry = DeviceRegistry::new();
    let device = registry
        .attach(&bus, config)
        .map_err(|err| device_error("attach failed", err))?;
    let connection = ConnectionId::new(bus.name(), device.address()).to_string();

    info!(%connection, steps = steps.len(), "replaying script");
    script::run(&bus, device.address(), &steps)
        .map_err(|err| transport_error("replay failed", err))?;

    let data = device.read(args.len);
    print_readout(
        &Readout {
            connection: &connection,
            device: &device,
            data: &data,
            snapshot: device.reader().snapshot(),
        },
        format,
    );

    registry
        .detach(&bus, device.address())
        .map_err(|err| device_error("detach failed", err))?;
    Ok(SUCCESS)
}
