//! Selector-routed frame assembly for byte-at-a-time bus slaves.
//!
//! This is the core of altslave. A bus master writes sessions of the form:
//! - One selector byte: `0` for the CPU channel, `1` for the DDR channel
//! - Payload bytes, written into that channel's 18-byte buffer
//!
//! Long sessions wrap and overwrite the buffer from the start. Out-of-range
//! selectors silently drop the rest of the session. Nothing here can fail.

pub mod assembler;
pub mod channel;
pub mod store;

pub use assembler::{FrameAssembler, Outcome};
pub use channel::{
    channel_name, is_valid_selector, AssemblerState, Channel, CHANNEL_A, CHANNEL_B, MSG_LEN,
    PAYLOAD_LEN, STORE_LEN, TRAILER_LEN,
};
pub use store::{MessageSnapshot, MessageStore};
