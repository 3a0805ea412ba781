//! Bus scripts: line-oriented master traffic for the simulated bus.
//!
//! ```text
//! # CPU message, one session
//! write 0x00 0x11 0x22 0x33
//! # the same, edge by edge
//! start
//! byte 0
//! byte 0x11
//! stop
//! read
//! ```

use std::path::Path;

use altslave_transport::{BusEvent, SimBus, SlaveAddress, TransportError};

use crate::exit::{io_error, CliError, CliResult, DATA_INVALID};

/// One script directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Write request (start condition).
    Start,
    /// One received byte.
    Byte(u8),
    /// Stop condition.
    Stop,
    /// A full session: start, bytes, stop.
    Write(Vec<u8>),
    /// A one-byte master read.
    Read,
}

pub fn load(path: &Path) -> CliResult<Vec<Step>> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    parse(&text)
}

pub fn parse(text: &str) -> CliResult<Vec<Step>> {
    let mut steps = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let lineno = idx + 1;
        let mut words = line.split_whitespace();
        let directive = words.next().unwrap_or("");
        let args: Vec<&str> = words.collect();

        let step = match directive {
            "start" => no_args(lineno, directive, &args, Step::Start)?,
            "stop" => no_args(lineno, directive, &args, Step::Stop)?,
            "read" => no_args(lineno, directive, &args, Step::Read)?,
            "byte" => match args.as_slice() {
                [value] => Step::Byte(parse_byte(lineno, value)?),
                _ => return Err(invalid(lineno, "byte takes exactly one value")),
            },
            "write" => Step::Write(
                args.iter()
                    .map(|value| parse_byte(lineno, value))
                    .collect::<CliResult<_>>()?,
            ),
            other => return Err(invalid(lineno, &format!("unknown directive '{other}'"))),
        };
        steps.push(step);
    }
    Ok(steps)
}

/// Drive the slave at `address` through every step in order.
pub fn run(bus: &SimBus, address: SlaveAddress, steps: &[Step]) -> Result<(), TransportError> {
    for step in steps {
        match step {
            Step::Start => bus.deliver(address, BusEvent::WriteRequested)?,
            Step::Byte(value) => bus.deliver(address, BusEvent::WriteReceived(*value))?,
            Step::Stop => bus.stop(address)?,
            Step::Write(bytes) => bus.write(address, bytes)?,
            Step::Read => bus.read(address)?,
        }
    }
    Ok(())
}

/// Parse a byte written as decimal or `0x` hex.
pub fn parse_u8(input: &str) -> Option<u8> {
    match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => input.parse().ok(),
    }
}

fn parse_byte(lineno: usize, input: &str) -> CliResult<u8> {
    parse_u8(input).ok_or_else(|| invalid(lineno, &format!("invalid byte '{input}'")))
}

fn no_args(lineno: usize, directive: &str, args: &[&str], step: Step) -> CliResult<Step> {
    if args.is_empty() {
        Ok(step)
    } else {
        Err(invalid(lineno, &format!("{directive} takes no arguments")))
    }
}

fn invalid(lineno: usize, message: &str) -> CliError {
    CliError::new(DATA_INVALID, format!("script line {lineno}: {message}"))
}
