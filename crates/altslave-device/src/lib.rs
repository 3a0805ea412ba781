//! Per-connection bus-slave devices.
//!
//! This is the attach/detach layer. Each attached device owns one frame
//! assembler behind a lock, receives bus events for its address, and exposes
//! its two message buffers to readers that never take that lock.

pub mod completion;
pub mod config;
pub mod device;
pub mod error;
pub mod registry;

pub use completion::{SessionSignal, Wait};
pub use config::{DeviceConfig, DEFAULT_ADDRESS, DEFAULT_NAME, DEFAULT_WAIT_TIMEOUT_MS};
pub use device::{MessageReader, SlaveDevice};
pub use error::{DeviceError, Result};
pub use registry::{ConnectionId, DeviceRegistry};
