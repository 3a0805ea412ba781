/// One edge of bus activity as seen by a slave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// The master addressed this slave for a write (start or repeated start).
    WriteRequested,
    /// The master clocked one byte into this slave.
    WriteReceived(u8),
    /// The master addressed this slave for a read.
    ReadRequested,
    /// The master consumed the byte offered for a read.
    ReadProcessed,
    /// Stop condition: the transaction is over.
    Stop,
}

impl BusEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            BusEvent::WriteRequested => "write_requested",
            BusEvent::WriteReceived(_) => "write_received",
            BusEvent::ReadRequested => "read_requested",
            BusEvent::ReadProcessed => "read_processed",
            BusEvent::Stop => "stop",
        }
    }

    /// The data byte carried by the event, zero for edges without one.
    pub fn value(&self) -> u8 {
        match self {
            BusEvent::WriteReceived(value) => *value,
            _ => 0,
        }
    }
}
