use std::fmt;

use crate::error::{Result, TransportError};

/// A 7-bit bus slave address.
///
/// Addresses 0x00-0x07 and 0x78-0x7F are reserved by the bus specification
/// and rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlaveAddress(u8);

impl SlaveAddress {
    /// Lowest assignable address.
    pub const MIN: u8 = 0x08;
    /// Highest assignable address.
    pub const MAX: u8 = 0x77;

    /// Validate and wrap a raw address.
    pub fn new(raw: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&raw) {
            Ok(Self(raw))
        } else {
            Err(TransportError::InvalidAddress(raw))
        }
    }

    /// The raw 7-bit value.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for SlaveAddress {
    type Error = TransportError;

    fn try_from(raw: u8) -> Result<Self> {
        Self::new(raw)
    }
}

impl fmt::Display for SlaveAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_usable_range() {
        assert_eq!(SlaveAddress::new(0x08).unwrap().get(), 0x08);
        assert_eq!(SlaveAddress::new(0x3c).unwrap().get(), 0x3c);
        assert_eq!(SlaveAddress::new(0x77).unwrap().get(), 0x77);
    }

    #[test]
    fn rejects_reserved_addresses() {
        for raw in [0x00, 0x07, 0x78, 0x7f, 0xff] {
            assert!(matches!(
                SlaveAddress::new(raw),
                Err(TransportError::InvalidAddress(r)) if r == raw
            ));
        }
    }

    #[test]
    fn displays_as_hex() {
        let addr = SlaveAddress::try_from(0x3c).unwrap();
        assert_eq!(addr.to_string(), "0x3c");
    }
}
