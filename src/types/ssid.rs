use core::fmt;

use heapless::Vec;

pub const SSID_MAX_LEN: usize = 32;

/// Network name, 0..=32 raw bytes. Empty means hidden (record) or wildcard (profile).
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Ssid {
    bytes: Vec<u8, SSID_MAX_LEN>,
}

impl Ssid {
    pub const fn empty() -> Self {
        Self { bytes: Vec::new() }
    }

    pub fn new(bytes: &[u8]) -> Option<Self> {
        Vec::from_slice(bytes).ok().map(|bytes| Self { bytes })
    }

    pub fn from_text(value: &str) -> Option<Self> {
        Self::new(value.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Ssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ssid(\"{self}\")")
    }
}

impl fmt::Display for Ssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.bytes.iter() {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }
        Ok(())
    }
}
