//! Two-channel message capture for byte-at-a-time bus slaves.
//!
//! altslave reassembles messages that a bus master writes to a slave one
//! byte per callback. The first byte of each session picks the CPU or DDR
//! channel; the rest fills that channel's fixed buffer. Readers copy both
//! buffers out whenever they like.
//!
//! # Crate Structure
//!
//! - [`transport`]: Bus events, slave addresses, simulated bus
//! - [`frame`]: Frame assembler state machine and message store
//! - [`device`]: Attached devices, registry, blocking wait (behind `device` feature)

/// Re-export transport types.
pub mod transport {
    pub use altslave_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use altslave_frame::*;
}

/// Re-export device types (requires `device` feature).
#[cfg(feature = "device")]
pub mod device {
    pub use altslave_device::*;
}
