use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::address::SlaveAddress;
use crate::error::{Result, TransportError};
use crate::event::BusEvent;
use crate::traits::SlaveHandler;

/// An in-process bus where the caller plays the master.
///
/// Each registered slave gets its own line lock. Every event delivered to an
/// address runs with that lock held, so callbacks for one slave never overlap,
/// and a whole session sent with [`SimBus::write`] reaches the slave without
/// interleaving from other masters.
pub struct SimBus {
    name: String,
    slaves: Mutex<HashMap<SlaveAddress, Slot>>,
    shut_down: AtomicBool,
}

#[derive(Clone)]
struct Slot {
    handler: Arc<dyn SlaveHandler>,
    line: Arc<Mutex<()>>,
}

impl SimBus {
    /// Create an empty bus.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slaves: Mutex::new(HashMap::new()),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Bus name, used as part of the connection identity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach a slave handler at `address`.
    pub fn register(&self, address: SlaveAddress, handler: Arc<dyn SlaveHandler>) -> Result<()> {
        self.ensure_running()?;
        let mut slaves = self.slaves.lock().unwrap_or_else(PoisonError::into_inner);
        if slaves.contains_key(&address) {
            return Err(TransportError::AddressInUse(address));
        }
        slaves.insert(
            address,
            Slot {
                handler,
                line: Arc::new(Mutex::new(())),
            },
        );
        info!(bus = %self.name, %address, "slave registered");
        Ok(())
    }

    /// Detach the slave at `address`, returning its handler.
    ///
    /// Waits for any in-flight event on that address to finish first.
    pub fn unregister(&self, address: SlaveAddress) -> Result<Arc<dyn SlaveHandler>> {
        let slot = self
            .slaves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&address)
            .ok_or(TransportError::NoDevice(address))?;
        drop(slot.line.lock().unwrap_or_else(PoisonError::into_inner));
        info!(bus = %self.name, %address, "slave unregistered");
        Ok(slot.handler)
    }

    /// Whether a slave is registered at `address`.
    pub fn is_registered(&self, address: SlaveAddress) -> bool {
        self.slaves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&address)
    }

    /// Addresses with a registered slave, in ascending order.
    pub fn addresses(&self) -> Vec<SlaveAddress> {
        let mut addrs: Vec<_> = self
            .slaves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        addrs.sort();
        addrs
    }

    /// Deliver a single event to the slave at `address`.
    pub fn deliver(&self, address: SlaveAddress, event: BusEvent) -> Result<()> {
        self.deliver_all(address, std::iter::once(event))
    }

    /// Run one complete write session: start, every byte, stop.
    pub fn write(&self, address: SlaveAddress, bytes: &[u8]) -> Result<()> {
        let events = std::iter::once(BusEvent::WriteRequested)
            .chain(bytes.iter().copied().map(BusEvent::WriteReceived))
            .chain(std::iter::once(BusEvent::Stop));
        self.deliver_all(address, events)
    }

    /// Start a write session and send bytes without a stop condition.
    pub fn write_partial(&self, address: SlaveAddress, bytes: &[u8]) -> Result<()> {
        let events = std::iter::once(BusEvent::WriteRequested)
            .chain(bytes.iter().copied().map(BusEvent::WriteReceived));
        self.deliver_all(address, events)
    }

    /// Issue a stop condition to `address`.
    pub fn stop(&self, address: SlaveAddress) -> Result<()> {
        self.deliver(address, BusEvent::Stop)
    }

    /// Issue a one-byte master read to `address` (request, processed, stop).
    pub fn read(&self, address: SlaveAddress) -> Result<()> {
        self.deliver_all(
            address,
            [
                BusEvent::ReadRequested,
                BusEvent::ReadProcessed,
                BusEvent::Stop,
            ],
        )
    }

    /// Stop accepting traffic and drop every registered slave.
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
        self.slaves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        info!(bus = %self.name, "bus shut down");
    }

    /// Deliver a sequence of events while holding the slave's line lock.
    pub fn deliver_all(
        &self,
        address: SlaveAddress,
        events: impl IntoIterator<Item = BusEvent>,
    ) -> Result<()> {
        self.ensure_running()?;
        let slot = self
            .slaves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&address)
            .cloned()
            .ok_or(TransportError::NoDevice(address))?;

        let _line = slot.line.lock().unwrap_or_else(PoisonError::into_inner);
        for event in events {
            debug!(bus = %self.name, %address, event = event.name(), "bus event");
            slot.handler.on_event(event);
        }
        Ok(())
    }

    fn ensure_running(&self) -> Result<()> {
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(TransportError::Shutdown(self.name.clone()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for SimBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimBus")
            .field("name", &self.name)
            .field("slaves", &self.addresses())
            .finish()
    }
}
