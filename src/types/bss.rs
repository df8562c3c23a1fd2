use enumset::{EnumSet, EnumSetType};
use heapless::Vec;

use super::{Bssid, BssSecurity, Ssid};

pub const BASIC_RATES_MAX: usize = 12;

#[derive(EnumSetType, Debug)]
pub enum BssCapability {
    Ess,
    Ibss,
    Pbss,
    Mesh,
    Privacy,
}

/// BSS membership selectors carried in the supported-rates elements.
#[derive(EnumSetType, Debug)]
pub enum PhySelector {
    Ht,
    Vht,
    He,
    SaeH2e,
}

/// One discovered BSS as decoded from a scan result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BssRecord {
    pub bssid: Bssid,
    pub ssid: Ssid,
    pub freq_mhz: u32,
    pub signal_dbm: i16,
    pub caps: EnumSet<BssCapability>,
    pub security: BssSecurity,
    /// Basic rates in 500 kb/s units.
    pub basic_rates: Vec<u8, BASIC_RATES_MAX>,
    pub selectors: EnumSet<PhySelector>,
    pub last_seen_ms: u64,
}

impl BssRecord {
    pub fn new(bssid: Bssid, ssid: Ssid, freq_mhz: u32, signal_dbm: i16) -> Self {
        Self {
            bssid,
            ssid,
            freq_mhz,
            signal_dbm,
            caps: EnumSet::only(BssCapability::Ess),
            security: BssSecurity::open(),
            basic_rates: Vec::new(),
            selectors: EnumSet::empty(),
            last_seen_ms: 0,
        }
    }

    pub fn with_caps(mut self, caps: EnumSet<BssCapability>) -> Self {
        self.caps = caps;
        self
    }

    pub fn with_security(mut self, security: BssSecurity) -> Self {
        self.security = security;
        self
    }

    pub fn seen_at(mut self, now_ms: u64) -> Self {
        self.last_seen_ms = now_ms;
        self
    }

    pub fn privacy(&self) -> bool {
        self.caps.contains(BssCapability::Privacy)
    }

    /// Signal magnitude in dB, e.g. 55 for -55 dBm.
    pub fn signal_magnitude(&self) -> i32 {
        -i32::from(self.signal_dbm)
    }

    pub fn band(&self) -> Band {
        Band::from_freq(self.freq_mhz)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    Unknown,
    Band2_4GHz,
    Band5GHz,
    Band6GHz,
    Band60GHz,
}

impl Band {
    pub const fn from_freq(freq_mhz: u32) -> Self {
        match freq_mhz {
            2_400..=2_500 => Self::Band2_4GHz,
            5_925..=7_125 => Self::Band6GHz,
            4_900..=5_924 => Self::Band5GHz,
            56_160..=70_200 => Self::Band60GHz,
            _ => Self::Unknown,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Band2_4GHz => "2.4GHz",
            Self::Band5GHz => "5GHz",
            Self::Band6GHz => "6GHz",
            Self::Band60GHz => "60GHz",
        }
    }
}
