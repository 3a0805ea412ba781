use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use altslave_transport::{SimBus, SlaveAddress};
use tracing::{debug, info};

use crate::config::DeviceConfig;
use crate::device::SlaveDevice;
use crate::error::{DeviceError, Result};

/// Identity of one attached connection: which bus, which address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId {
    pub bus: String,
    pub address: SlaveAddress,
}

impl ConnectionId {
    pub fn new(bus: impl Into<String>, address: SlaveAddress) -> Self {
        Self {
            bus: bus.into(),
            address,
        }
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.bus, self.address)
    }
}

/// Attached devices, each addressable by its connection.
///
/// Attaching creates a fresh device and registers it on the bus; detaching
/// unregisters it and wakes anyone blocked in `wait_message`. Nothing survives
/// a detach.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Mutex<BTreeMap<ConnectionId, Arc<SlaveDevice>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a device from `config` and attach it to `bus`.
    pub fn attach(&self, bus: &SimBus, config: DeviceConfig) -> Result<Arc<SlaveDevice>> {
        let device = Arc::new(SlaveDevice::new(config)?);
        let id = ConnectionId::new(bus.name(), device.address());

        let mut devices = self.lock();
        if devices.contains_key(&id) {
            return Err(DeviceError::AlreadyAttached(id.to_string()));
        }
        bus.register(device.address(), device.clone())?;
        devices.insert(id.clone(), Arc::clone(&device));

        info!(connection = %id, name = device.name(), "device attached");
        Ok(device)
    }

    /// Detach the device at `address` on `bus`, returning it.
    pub fn detach(&self, bus: &SimBus, address: SlaveAddress) -> Result<Arc<SlaveDevice>> {
        let id = ConnectionId::new(bus.name(), address);
        let device = self
            .lock()
            .remove(&id)
            .ok_or_else(|| DeviceError::NotAttached(id.to_string()))?;

        if let Err(err) = bus.unregister(address) {
            debug!(connection = %id, %err, "slave already gone from bus");
        }
        device.close();

        info!(connection = %id, name = device.name(), "device detached");
        Ok(device)
    }

    /// Look up an attached device.
    pub fn get(&self, id: &ConnectionId) -> Option<Arc<SlaveDevice>> {
        self.lock().get(id).cloned()
    }

    /// Attached connections, in order.
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<ConnectionId, Arc<SlaveDevice>>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use altslave_frame::{AssemblerState, MSG_LEN};
    use altslave_transport::{BusEvent, TransportError};

    use super::*;

    fn addr(raw: u8) -> SlaveAddress {
        SlaveAddress::new(raw).unwrap()
    }

    #[test]
    fn attach_registers_on_bus() {
        let bus = SimBus::new("i2c-0");
        let registry = DeviceRegistry::new();

        let device = registry.attach(&bus, DeviceConfig::default()).unwrap();

        assert!(bus.is_registered(device.address()));
        assert_eq!(registry.len(), 1);
        let id = ConnectionId::new("i2c-0", addr(0x3c));
        assert_eq!(id.to_string(), "i2c-0@0x3c");
        assert!(Arc::ptr_eq(&registry.get(&id).unwrap(), &device));
    }

    #[test]
    fn devices_on_different_connections_are_independent() {
        let bus0 = SimBus::new("i2c-0");
        let bus1 = SimBus::new("i2c-1");
        let registry = DeviceRegistry::new();

        let a = registry.attach(&bus0, DeviceConfig::default()).unwrap();
        let b = registry.attach(&bus1, DeviceConfig::default()).unwrap();
        let c = registry
            .attach(&bus0, DeviceConfig::default().with_address(0x3d))
            .unwrap();

        bus0.write(a.address(), &[0, 0xa1]).unwrap();
        bus1.write(b.address(), &[0, 0xb1]).unwrap();
        bus0.write(c.address(), &[1, 0xc1]).unwrap();

        assert_eq!(a.read(1)[0], 0xa1);
        assert_eq!(b.read(1)[0], 0xb1);
        assert_eq!(c.read(MSG_LEN + 1)[MSG_LEN], 0xc1);
        assert_eq!(registry.ids().len(), 3);
    }

    #[test]
    fn attach_twice_is_rejected() {
        let bus = SimBus::new("i2c-0");
        let registry = DeviceRegistry::new();
        registry.attach(&bus, DeviceConfig::default()).unwrap();

        let err = registry
            .attach(&bus, DeviceConfig::default())
            .unwrap_err();
        assert!(matches!(err, DeviceError::AlreadyAttached(id) if id == "i2c-0@0x3c"));
    }

    #[test]
    fn attach_onto_foreign_slave_is_transport_error() {
        let bus = SimBus::new("i2c-0");
        bus.register(addr(0x3c), Arc::new(|_event: BusEvent| {})).unwrap();
        let registry = DeviceRegistry::new();

        let err = registry
            .attach(&bus, DeviceConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DeviceError::Transport(TransportError::AddressInUse(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn detach_unregisters_and_releases_waiters() {
        let bus = SimBus::new("i2c-0");
        let registry = DeviceRegistry::new();
        let device = registry.attach(&bus, DeviceConfig::default()).unwrap();

        let waiter = {
            let device = Arc::clone(&device);
            std::thread::spawn(move || device.wait_message(Some(Duration::from_secs(5))))
        };
        std::thread::sleep(Duration::from_millis(20));

        registry.detach(&bus, device.address()).unwrap();

        assert!(!bus.is_registered(device.address()));
        assert!(registry.is_empty());
        assert!(matches!(
            waiter.join().unwrap(),
            Err(DeviceError::Detached(_))
        ));
    }

    #[test]
    fn detach_unknown_is_not_attached() {
        let bus = SimBus::new("i2c-0");
        let registry = DeviceRegistry::new();
        let err = registry.detach(&bus, addr(0x10)).unwrap_err();
        assert!(matches!(err, DeviceError::NotAttached(_)));
    }

    #[test]
    fn reattach_starts_fresh() {
        let bus = SimBus::new("i2c-0");
        let registry = DeviceRegistry::new();
        let first = registry.attach(&bus, DeviceConfig::default()).unwrap();
        bus.write_partial(first.address(), &[0, 0x55]).unwrap();
        registry.detach(&bus, first.address()).unwrap();

        let second = registry.attach(&bus, DeviceConfig::default()).unwrap();
        assert_eq!(second.state(), AssemblerState::Idle);
        assert_eq!(second.cursor(), 0);
        assert_eq!(second.read(1)[0], 0);
    }
}
