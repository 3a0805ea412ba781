//! Bus-slave transport abstraction.
//!
//! Models the callback surface of a bus slave backend: the bus master opens a
//! write session, clocks bytes in one at a time, and ends the session with a
//! stop condition. Each of those edges reaches the registered slave as a
//! [`BusEvent`] through the [`SlaveHandler`] trait.
//!
//! This is the lowest layer of altslave. [`SimBus`] plays the bus master in
//! process so the upper layers can be driven without hardware.

pub mod address;
pub mod error;
pub mod event;
pub mod sim;
pub mod traits;

pub use address::SlaveAddress;
pub use error::{Result, TransportError};
pub use event::BusEvent;
pub use sim::SimBus;
pub use traits::SlaveHandler;
