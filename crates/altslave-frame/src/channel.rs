//! Channel selectors and message sizing.
//!
//! The first byte of every write session is a selector. Selector 0 routes the
//! rest of the session into the CPU message buffer, selector 1 into the DDR
//! message buffer. Anything else is rejected for the remainder of the session.

/// Payload bytes per message.
pub const PAYLOAD_LEN: usize = 16;

/// Trailer bytes per message.
pub const TRAILER_LEN: usize = 2;

/// Size of each channel buffer.
pub const MSG_LEN: usize = PAYLOAD_LEN + TRAILER_LEN;

/// Size of the concatenated read-out view (channel A then channel B).
pub const STORE_LEN: usize = 2 * MSG_LEN;

/// Selector for CPU messages.
pub const CHANNEL_A: u8 = 0;

/// Selector for DDR messages.
pub const CHANNEL_B: u8 = 1;

/// One of the two message channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    A,
    B,
}

impl Channel {
    /// Both channels in read-out order.
    pub const ALL: [Channel; 2] = [Channel::A, Channel::B];

    /// The selector byte that picks this channel.
    pub fn selector(self) -> u8 {
        match self {
            Channel::A => CHANNEL_A,
            Channel::B => CHANNEL_B,
        }
    }

    /// Offset of this channel's buffer within the read-out view.
    pub fn offset(self) -> usize {
        match self {
            Channel::A => 0,
            Channel::B => MSG_LEN,
        }
    }

    pub fn name(self) -> &'static str {
        channel_name(self.selector())
    }
}

/// Receive state of a frame assembler.
///
/// The discriminants of the two receive states equal their selector bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AssemblerState {
    RecvChannelA = 0,
    RecvChannelB = 1,
    /// Waiting for the selector byte of a session.
    Idle = 2,
    /// The session opened with an unknown selector; payload is dropped.
    InvalidSelector = 3,
}

impl AssemblerState {
    /// Classify a selector byte.
    pub fn from_selector(value: u8) -> Self {
        match value {
            CHANNEL_A => AssemblerState::RecvChannelA,
            CHANNEL_B => AssemblerState::RecvChannelB,
            _ => AssemblerState::InvalidSelector,
        }
    }

    /// The channel this state writes into, if any.
    pub fn channel(self) -> Option<Channel> {
        match self {
            AssemblerState::RecvChannelA => Some(Channel::A),
            AssemblerState::RecvChannelB => Some(Channel::B),
            AssemblerState::Idle | AssemblerState::InvalidSelector => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AssemblerState::RecvChannelA => "recv_channel_a",
            AssemblerState::RecvChannelB => "recv_channel_b",
            AssemblerState::Idle => "idle",
            AssemblerState::InvalidSelector => "invalid_selector",
        }
    }
}

/// Returns a human-readable name for a selector byte.
pub fn channel_name(selector: u8) -> &'static str {
    match selector {
        CHANNEL_A => "CPU",
        CHANNEL_B => "DDR",
        _ => "INVALID",
    }
}

/// Returns true if the selector picks a real channel.
pub fn is_valid_selector(selector: u8) -> bool {
    selector < AssemblerState::Idle as u8
}
