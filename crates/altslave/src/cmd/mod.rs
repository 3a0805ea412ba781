use std::path::PathBuf;
use std::time::Duration;

use altslave_device::DeviceConfig;
use altslave_frame::STORE_LEN;
use clap::{Args, Subcommand};

use crate::exit::{device_error, io_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod layout;
pub mod replay;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a bus script into a device and print the read-out.
    Replay(ReplayArgs),
    /// Replay a bus script in a loop while reading the device concurrently.
    Watch(WatchArgs),
    /// Show where each message region sits in the read-out.
    Layout(LayoutArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Replay(args) => replay::run(args, format),
        Command::Watch(args) => watch::run(args, format),
        Command::Layout(args) => layout::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Device and bus options shared by commands that attach a device.
#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// Bus name used in the connection identity.
    #[arg(long, default_value = "i2c-0")]
    pub bus: String,
    /// Slave address (decimal or 0x hex). Overrides --config.
    #[arg(long, value_parser = parse_address)]
    pub address: Option<u8>,
    /// Device name. Overrides --config.
    #[arg(long)]
    pub name: Option<String>,
    /// JSON device config file.
    #[arg(long, value_name = "FILE", env = "ALTSLAVE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Bus script to replay.
    pub script: PathBuf,
    /// Bytes to copy from the read-out.
    #[arg(long, default_value_t = STORE_LEN)]
    pub len: usize,
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Bus script replayed on every pass.
    pub script: PathBuf,
    /// Bytes to copy from the read-out.
    #[arg(long, default_value_t = STORE_LEN)]
    pub len: usize,
    /// Delay between passes and between reads (e.g. 200ms, 1s).
    #[arg(long, default_value = "200ms")]
    pub interval: String,
    /// Print only after a session completes on a valid channel.
    #[arg(long)]
    pub sessions: bool,
    /// Exit after N read-outs.
    #[arg(long)]
    pub count: Option<usize>,
    #[command(flatten)]
    pub device: DeviceArgs,
}

#[derive(Args, Debug, Default)]
pub struct LayoutArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Build the device config from `--config` plus flag overrides.
pub fn resolve_config(args: &DeviceArgs) -> CliResult<DeviceConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|err| {
                io_error(&format!("failed reading {}", path.display()), err)
            })?;
            DeviceConfig::from_json_str(&text)
                .map_err(|err| device_error(&format!("invalid config {}", path.display()), err))?
        }
        None => DeviceConfig::default(),
    };

    if let Some(address) = args.address {
        config.address = address;
    }
    if let Some(name) = &args.name {
        config.name = name.clone();
    }
    config
        .validate()
        .map_err(|err| device_error("invalid device options", err))?;
    Ok(config)
}

fn parse_address(input: &str) -> Result<u8, String> {
    crate::script::parse_u8(input).ok_or_else(|| format!("invalid address '{input}'"))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::DATA_INVALID;

    fn device_args() -> DeviceArgs {
        DeviceArgs {
            bus: "i2c-0".to_string(),
            address: None,
            name: None,
            config: None,
        }
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration(" ").is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let args = DeviceArgs {
            address: Some(0x42),
            name: Some("bmc".to_string()),
            ..device_args()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.address, 0x42);
        assert_eq!(config.name, "bmc");
    }

    #[test]
    fn reserved_address_is_usage_error() {
        let args = DeviceArgs {
            address: Some(0x01),
            ..device_args()
        };
        assert_eq!(resolve_config(&args).unwrap_err().code, USAGE);
    }

    #[test]
    fn config_file_is_loaded_then_overridden() {
        let dir = std::env::temp_dir().join(format!("altslave-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("device.json");
        std::fs::write(&path, r#"{"name": "from-file", "address": 80}"#).unwrap();

        let args = DeviceArgs {
            config: Some(path.clone()),
            address: Some(0x51),
            ..device_args()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.name, "from-file");
        assert_eq!(config.address, 0x51);

        std::fs::write(&path, r#"{"address": "x"}"#).unwrap();
        let args = DeviceArgs {
            config: Some(path),
            ..device_args()
        };
        assert_eq!(resolve_config(&args).unwrap_err().code, DATA_INVALID);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn parse_address_accepts_hex() {
        assert_eq!(parse_address("0x3c"), Ok(0x3c));
        assert!(parse_address("0x100").is_err());
    }
}
