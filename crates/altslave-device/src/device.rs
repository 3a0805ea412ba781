use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use altslave_frame::{AssemblerState, FrameAssembler, MessageSnapshot, MessageStore, Outcome};
use altslave_transport::{BusEvent, SlaveAddress, SlaveHandler};
use bytes::Bytes;
use tracing::{debug, trace};

use crate::completion::{SessionSignal, Wait};
use crate::config::DeviceConfig;
use crate::error::{DeviceError, Result};

/// Bytes of each buffer shown in the stop-condition trace dump.
const DUMP_LEN: usize = 8;

/// One attached bus slave: a frame assembler behind a connection-scoped lock,
/// plus the shared message store it fills.
///
/// Bus events go through [`SlaveHandler::on_event`], which takes the lock.
/// Read-outs ([`SlaveDevice::read`], [`MessageReader`]) go straight to the
/// store and never take it, so they may observe a session half-written.
#[derive(Debug)]
pub struct SlaveDevice {
    config: DeviceConfig,
    address: SlaveAddress,
    assembler: Mutex<FrameAssembler>,
    store: Arc<MessageStore>,
    signal: SessionSignal,
}

impl SlaveDevice {
    /// Create a detached device: `Idle`, cursor 0, zeroed buffers.
    pub fn new(config: DeviceConfig) -> Result<Self> {
        let address = config.validate()?;
        let store = Arc::new(MessageStore::new());
        Ok(Self {
            config,
            address,
            assembler: Mutex::new(FrameAssembler::with_store(Arc::clone(&store))),
            store,
            signal: SessionSignal::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn address(&self) -> SlaveAddress {
        self.address
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Copy up to `max_len` bytes of the read-out view (CPU then DDR buffer).
    pub fn read(&self, max_len: usize) -> Bytes {
        self.store.read(max_len)
    }

    /// A cloneable read-out handle that outlives borrows of the device.
    pub fn reader(&self) -> MessageReader {
        MessageReader {
            store: Arc::clone(&self.store),
        }
    }

    /// Block until a session that selected a valid channel ends, and return
    /// both buffers as they stood at that session's stop condition.
    ///
    /// Only sessions that end after this call begins count. If several end
    /// before the caller wakes, the latest one is returned. Bytes the master
    /// writes after that stop never appear in the result. `None` uses the
    /// configured wait timeout.
    pub fn wait_message(&self, timeout: Option<Duration>) -> Result<MessageSnapshot> {
        let timeout = timeout.unwrap_or_else(|| self.config.wait_timeout());
        let seen = self.signal.generation();
        match self.signal.wait_past(seen, timeout) {
            Wait::Completed(_, snapshot) => Ok(snapshot),
            Wait::TimedOut => Err(DeviceError::Timeout(timeout)),
            Wait::Closed => Err(DeviceError::Detached(self.config.name.clone())),
        }
    }

    /// Current receive state.
    pub fn state(&self) -> AssemblerState {
        self.lock().state()
    }

    /// Payload bytes accepted in the current session.
    pub fn cursor(&self) -> usize {
        self.lock().cursor()
    }

    /// Sessions completed on a valid channel since creation.
    pub fn sessions_completed(&self) -> u64 {
        self.signal.generation()
    }

    /// Release waiters; called when the device is detached.
    pub(crate) fn close(&self) {
        self.signal.close();
    }

    fn lock(&self) -> MutexGuard<'_, FrameAssembler> {
        self.assembler.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SlaveHandler for SlaveDevice {
    fn on_event(&self, event: BusEvent) {
        let mut asm = self.lock();
        let selected = asm.state().channel().is_some();
        let outcome = asm.handle(event);

        debug!(
            device = %self.config.name,
            event = event.name(),
            value = format_args!("0x{:02x}", event.value()),
            "slave event"
        );

        if outcome == Outcome::Selected(AssemblerState::InvalidSelector) {
            debug!(
                device = %self.config.name,
                selector = event.value(),
                "invalid selector; discarding session"
            );
        }

        if event == BusEvent::Stop && selected {
            // Captured under the lock: no later session can have written yet.
            let snap = self.store.snapshot();
            trace!(
                device = %self.config.name,
                cpu = ?&snap.cpu()[..DUMP_LEN],
                ddr = ?&snap.ddr()[..DUMP_LEN],
                "session complete"
            );
            self.signal.complete(snap);
        }
    }
}

/// Read-out handle over a device's message store.
#[derive(Debug, Clone)]
pub struct MessageReader {
    store: Arc<MessageStore>,
}

impl MessageReader {
    /// Copy up to `max_len` bytes from the start of the read-out view.
    pub fn read(&self, max_len: usize) -> Bytes {
        self.store.read(max_len)
    }

    /// Copy into `dst`, returning the number of bytes written.
    pub fn read_into(&self, dst: &mut [u8]) -> usize {
        self.store.read_into(dst)
    }

    pub fn snapshot(&self) -> MessageSnapshot {
        self.store.snapshot()
    }
}
