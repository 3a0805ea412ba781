use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use altslave_device::SlaveDevice;
use altslave_frame::{Channel, MessageSnapshot, MSG_LEN, PAYLOAD_LEN, STORE_LEN, TRAILER_LEN};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One read-out of a device, as printed by `replay` and `watch`.
pub struct Readout<'a> {
    pub connection: &'a str,
    pub device: &'a SlaveDevice,
    pub data: &'a [u8],
    pub snapshot: MessageSnapshot,
}

#[derive(Serialize)]
struct ReadoutOutput<'a> {
    schema_id: &'a str,
    connection: &'a str,
    device: &'a str,
    state: &'a str,
    sessions_completed: u64,
    len: usize,
    data: String,
    cpu: ChannelOutput,
    ddr: ChannelOutput,
    timestamp: String,
}

#[derive(Serialize)]
struct ChannelOutput {
    selector: u8,
    payload: String,
    trailer: String,
}

impl ChannelOutput {
    fn new(snapshot: &MessageSnapshot, channel: Channel) -> Self {
        Self {
            selector: channel.selector(),
            payload: hex(snapshot.payload(channel)),
            trailer: hex(snapshot.trailer(channel)),
        }
    }
}

pub fn print_readout(readout: &Readout<'_>, format: OutputFormat) {
    let snapshot = &readout.snapshot;
    match format {
        OutputFormat::Json => {
            let out = ReadoutOutput {
                schema_id: "https://schemas.3leaps.dev/altslave/cli/v1/readout.schema.json",
                connection: readout.connection,
                device: readout.device.name(),
                state: readout.device.state().name(),
                sessions_completed: readout.device.sessions_completed(),
                len: readout.data.len(),
                data: hex(readout.data),
                cpu: ChannelOutput::new(snapshot, Channel::A),
                ddr: ChannelOutput::new(snapshot, Channel::B),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHANNEL", "SELECTOR", "PAYLOAD", "TRAILER"]);
            for channel in Channel::ALL {
                table.add_row(vec![
                    channel.name().to_string(),
                    channel.selector().to_string(),
                    hex(snapshot.payload(channel)),
                    hex(snapshot.trailer(channel)),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "connection={} state={} sessions={} len={} cpu=[{}] ddr=[{}]",
                readout.connection,
                readout.device.state().name(),
                readout.device.sessions_completed(),
                readout.data.len(),
                hex(snapshot.cpu()),
                hex(snapshot.ddr())
            );
        }
        OutputFormat::Raw => {
            print_raw(readout.data);
        }
    }
}

#[derive(Serialize)]
struct RegionOutput {
    region: String,
    offset: usize,
    len: usize,
}

/// Print where each buffer region sits in the read-out view.
pub fn print_layout(format: OutputFormat) {
    let regions: Vec<RegionOutput> = Channel::ALL
        .into_iter()
        .flat_map(|channel| {
            [
                RegionOutput {
                    region: format!("{} payload", channel.name()),
                    offset: channel.offset(),
                    len: PAYLOAD_LEN,
                },
                RegionOutput {
                    region: format!("{} trailer", channel.name()),
                    offset: channel.offset() + PAYLOAD_LEN,
                    len: TRAILER_LEN,
                },
            ]
        })
        .collect();

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "message_len": MSG_LEN,
                "store_len": STORE_LEN,
                "regions": regions,
            });
            println!("{out}");
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["REGION", "OFFSET", "LEN"]);
            for region in &regions {
                table.add_row(vec![
                    region.region.clone(),
                    region.offset.to_string(),
                    region.len.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for region in &regions {
                println!(
                    "{:<12} offset={:<2} len={}",
                    region.region, region.offset, region.len
                );
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Space-separated lowercase hex.
pub fn hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
