#[cfg(target_has_atomic = "64")]
use core::sync::atomic::{AtomicU64, Ordering};

use crate::types::Bssid;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LinkState {
    #[default]
    Disconnected = 0,
    Authenticating = 1,
    Associating = 2,
    Associated = 3,
    FourWayHandshake = 4,
    Completed = 5,
    InterfaceDisabled = 6,
}

impl LinkState {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Disconnected),
            1 => Some(Self::Authenticating),
            2 => Some(Self::Associating),
            3 => Some(Self::Associated),
            4 => Some(Self::FourWayHandshake),
            5 => Some(Self::Completed),
            6 => Some(Self::InterfaceDisabled),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Authenticating => "AUTHENTICATING",
            Self::Associating => "ASSOCIATING",
            Self::Associated => "ASSOCIATED",
            Self::FourWayHandshake => "4WAY_HANDSHAKE",
            Self::Completed => "COMPLETED",
            Self::InterfaceDisabled => "INTERFACE_DISABLED",
        }
    }

    pub const fn is_connecting(self) -> bool {
        matches!(self, Self::Authenticating | Self::Associating)
    }

    pub const fn is_linked(self) -> bool {
        matches!(
            self,
            Self::Associated | Self::FourWayHandshake | Self::Completed
        )
    }

    /// At least authenticating and not interface-disabled.
    pub const fn in_progress(self) -> bool {
        self.is_connecting() || self.is_linked()
    }
}

/// Copy of the externally visible link state.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LinkSnapshot {
    pub state: LinkState,
    /// Associated BSSID, or the pending one while connecting.
    pub bssid: Bssid,
    pub countermeasures: bool,
    pub admin_disconnected: bool,
}

impl LinkSnapshot {
    const BSSID_MASK: u64 = (1 << 48) - 1;
    const STATE_SHIFT: u32 = 48;
    const COUNTERMEASURES_SHIFT: u32 = 52;
    const ADMIN_SHIFT: u32 = 53;

    pub const fn packed(self) -> u64 {
        (self.bssid.to_u64() & Self::BSSID_MASK)
            | ((self.state.as_u8() as u64) << Self::STATE_SHIFT)
            | ((self.countermeasures as u64) << Self::COUNTERMEASURES_SHIFT)
            | ((self.admin_disconnected as u64) << Self::ADMIN_SHIFT)
    }

    pub const fn from_packed(raw: u64) -> Self {
        let state = match LinkState::from_u8(((raw >> Self::STATE_SHIFT) & 0b1111) as u8) {
            Some(state) => state,
            None => LinkState::Disconnected,
        };
        Self {
            state,
            bssid: Bssid::from_u64(raw & Self::BSSID_MASK),
            countermeasures: (raw >> Self::COUNTERMEASURES_SHIFT) & 1 == 1,
            admin_disconnected: (raw >> Self::ADMIN_SHIFT) & 1 == 1,
        }
    }
}

/// Lock-free publication slot for readers outside the dispatcher task.
#[cfg(target_has_atomic = "64")]
pub struct SnapshotCell {
    raw: AtomicU64,
}

#[cfg(target_has_atomic = "64")]
impl SnapshotCell {
    pub const fn new() -> Self {
        Self {
            raw: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, snapshot: LinkSnapshot) {
        self.raw.store(snapshot.packed(), Ordering::Relaxed);
    }

    pub fn read(&self) -> LinkSnapshot {
        LinkSnapshot::from_packed(self.raw.load(Ordering::Relaxed))
    }
}

#[cfg(target_has_atomic = "64")]
impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_packing_keeps_every_field() {
        let snapshot = LinkSnapshot {
            state: LinkState::FourWayHandshake,
            bssid: Bssid::new([0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]),
            countermeasures: true,
            admin_disconnected: false,
        };
        assert_eq!(LinkSnapshot::from_packed(snapshot.packed()), snapshot);
    }

    #[test]
    fn cell_starts_disconnected() {
        let cell = SnapshotCell::new();
        assert_eq!(cell.read(), LinkSnapshot::default());
        let snapshot = LinkSnapshot {
            state: LinkState::Completed,
            bssid: Bssid::new([2, 0, 0, 0, 0, 9]),
            countermeasures: false,
            admin_disconnected: true,
        };
        cell.publish(snapshot);
        assert_eq!(cell.read(), snapshot);
    }

    #[test]
    fn state_ordering_follows_progress() {
        assert!(LinkState::Associating > LinkState::Authenticating);
        assert!(LinkState::Completed.is_linked());
        assert!(!LinkState::InterfaceDisabled.in_progress());
        assert_eq!(LinkState::from_u8(7), None);
    }
}
