use std::sync::Arc;

use altslave_transport::BusEvent;

use crate::channel::{AssemblerState, Channel, MSG_LEN};
use crate::store::MessageStore;

/// What a single event did to the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Session boundary: back to `Idle`, cursor cleared.
    Reset,
    /// Selector byte consumed; the new state.
    Selected(AssemblerState),
    /// Payload byte written at `index` of `channel`'s buffer.
    Stored { channel: Channel, index: usize },
    /// Payload byte dropped (invalid selector for this session).
    Discarded,
    /// Event the assembler does not react to.
    Ignored,
}

/// Receive state machine for selector-routed sessions.
///
/// The first byte of a session picks a channel; every following byte is
/// written into that channel's buffer at `cursor % MSG_LEN`, so long sessions
/// overwrite the buffer from the start. The cursor is an 8-bit counter: after
/// 256 payload bytes it wraps to 0 and writing restarts at index 0, even
/// though 256 is not a multiple of `MSG_LEN`. Session start and stop reset the
/// machine. No operation fails.
///
/// The assembler itself is not synchronized: callers serialize the `on_*`
/// entry points per connection.
#[derive(Debug)]
pub struct FrameAssembler {
    state: AssemblerState,
    cursor: u8,
    store: Arc<MessageStore>,
}

impl FrameAssembler {
    /// Create an assembler with a fresh zeroed store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MessageStore::new()))
    }

    /// Create an assembler writing into an existing store.
    pub fn with_store(store: Arc<MessageStore>) -> Self {
        Self {
            state: AssemblerState::Idle,
            cursor: 0,
            store,
        }
    }

    /// The master opened a write session.
    pub fn on_session_start(&mut self) {
        self.reset();
    }

    /// The master ended the session.
    ///
    /// Bytes already received stay in the buffer.
    pub fn on_session_end(&mut self) {
        self.reset();
    }

    /// One byte from the master, in arrival order.
    pub fn on_byte(&mut self, value: u8) -> Outcome {
        if self.state == AssemblerState::Idle {
            self.state = AssemblerState::from_selector(value);
            return Outcome::Selected(self.state);
        }

        let Some(channel) = self.state.channel() else {
            return Outcome::Discarded;
        };

        let index = usize::from(self.cursor) % MSG_LEN;
        self.store.write(channel, index, value);
        self.cursor = self.cursor.wrapping_add(1);
        Outcome::Stored { channel, index }
    }

    /// Dispatch a bus event to the matching entry point.
    ///
    /// Master reads are not supported and leave the state untouched.
    pub fn handle(&mut self, event: BusEvent) -> Outcome {
        match event {
            BusEvent::WriteRequested => {
                self.on_session_start();
                Outcome::Reset
            }
            BusEvent::WriteReceived(value) => self.on_byte(value),
            BusEvent::Stop => {
                self.on_session_end();
                Outcome::Reset
            }
            BusEvent::ReadRequested | BusEvent::ReadProcessed => Outcome::Ignored,
        }
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Payload bytes accepted since the last session boundary, modulo 256.
    pub fn cursor(&self) -> usize {
        usize::from(self.cursor)
    }

    /// The store this assembler writes into.
    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    fn reset(&mut self) {
        self.state = AssemblerState::Idle;
        self.cursor = 0;
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}
