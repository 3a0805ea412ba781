use crate::address::SlaveAddress;

/// Errors that can occur in bus transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The address is outside the usable 7-bit range.
    #[error("invalid slave address 0x{0:02x} (expected 0x08..=0x77)")]
    InvalidAddress(u8),

    /// Another handler is already registered at this address.
    #[error("address {0} already has a registered slave")]
    AddressInUse(SlaveAddress),

    /// No handler is registered at this address.
    #[error("no slave registered at {0}")]
    NoDevice(SlaveAddress),

    /// The bus has been shut down.
    #[error("bus {0} shut down")]
    Shutdown(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
