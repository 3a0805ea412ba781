use std::sync::atomic::{AtomicU8, Ordering};

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;

use crate::channel::{Channel, MSG_LEN, PAYLOAD_LEN, STORE_LEN};

/// The two message buffers behind a frame assembler.
///
/// Laid out for read-out as channel A followed by channel B. Only the owning
/// assembler writes; readers copy bytes out at any time without taking the
/// assembler's lock. Every cell is an independent relaxed atomic, so a read
/// that overlaps a session may return a mix of old and new bytes (a torn
/// read) but never undefined data.
#[derive(Debug)]
pub struct MessageStore {
    cpu: [AtomicU8; MSG_LEN],
    ddr: [AtomicU8; MSG_LEN],
}

impl MessageStore {
    /// Create a store with both buffers zeroed.
    pub fn new() -> Self {
        Self {
            cpu: std::array::from_fn(|_| AtomicU8::new(0)),
            ddr: std::array::from_fn(|_| AtomicU8::new(0)),
        }
    }

    /// Copy up to `max_len` bytes from the start of the read-out view.
    ///
    /// Asking for more than [`STORE_LEN`] bytes is a short read, not an error.
    pub fn read(&self, max_len: usize) -> Bytes {
        let len = max_len.min(STORE_LEN);
        let mut out = BytesMut::with_capacity(len);
        for cell in self.cells().take(len) {
            out.put_u8(cell.load(Ordering::Relaxed));
        }
        out.freeze()
    }

    /// Copy into `dst`, returning the number of bytes written.
    pub fn read_into(&self, dst: &mut [u8]) -> usize {
        let mut written = 0;
        for (slot, cell) in dst.iter_mut().zip(self.cells()) {
            *slot = cell.load(Ordering::Relaxed);
            written += 1;
        }
        written
    }

    /// Copy one channel's buffer.
    pub fn channel(&self, channel: Channel) -> [u8; MSG_LEN] {
        let cells = self.buffer(channel);
        std::array::from_fn(|i| cells[i].load(Ordering::Relaxed))
    }

    /// Copy both buffers.
    pub fn snapshot(&self) -> MessageSnapshot {
        MessageSnapshot {
            cpu: self.channel(Channel::A),
            ddr: self.channel(Channel::B),
        }
    }

    /// Store `value` at `index % MSG_LEN` of `channel`'s buffer.
    pub(crate) fn write(&self, channel: Channel, index: usize, value: u8) {
        self.buffer(channel)[index % MSG_LEN].store(value, Ordering::Relaxed);
    }

    fn buffer(&self, channel: Channel) -> &[AtomicU8; MSG_LEN] {
        match channel {
            Channel::A => &self.cpu,
            Channel::B => &self.ddr,
        }
    }

    fn cells(&self) -> impl Iterator<Item = &AtomicU8> {
        self.cpu.iter().chain(self.ddr.iter())
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time copy of both message buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MessageSnapshot {
    cpu: [u8; MSG_LEN],
    ddr: [u8; MSG_LEN],
}

impl MessageSnapshot {
    /// Channel A (CPU) buffer.
    pub fn cpu(&self) -> &[u8; MSG_LEN] {
        &self.cpu
    }

    /// Channel B (DDR) buffer.
    pub fn ddr(&self) -> &[u8; MSG_LEN] {
        &self.ddr
    }

    pub fn channel(&self, channel: Channel) -> &[u8; MSG_LEN] {
        match channel {
            Channel::A => &self.cpu,
            Channel::B => &self.ddr,
        }
    }

    /// The payload region of a buffer. No framing is checked.
    pub fn payload(&self, channel: Channel) -> &[u8] {
        &self.channel(channel)[..PAYLOAD_LEN]
    }

    /// The trailer region of a buffer. No framing is checked.
    pub fn trailer(&self, channel: Channel) -> &[u8] {
        &self.channel(channel)[PAYLOAD_LEN..]
    }

    /// The concatenated read-out view.
    pub fn to_bytes(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(STORE_LEN);
        out.put_slice(&self.cpu);
        out.put_slice(&self.ddr);
        out.freeze()
    }
}
