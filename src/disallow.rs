use heapless::Vec;

use crate::{
    config::DISALLOW_CAPACITY,
    types::{Bssid, Ssid},
};

/// Operator deny list. Entries past capacity are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisallowList {
    bssids: Vec<Bssid, DISALLOW_CAPACITY>,
    ssids: Vec<Ssid, DISALLOW_CAPACITY>,
}

impl DisallowList {
    pub const fn new() -> Self {
        Self {
            bssids: Vec::new(),
            ssids: Vec::new(),
        }
    }

    pub fn from_parts(bssids: &[Bssid], ssids: &[Ssid]) -> Self {
        let mut list = Self::new();
        for bssid in bssids {
            list.add_bssid(*bssid);
        }
        for ssid in ssids {
            list.add_ssid(ssid.clone());
        }
        list
    }

    pub fn add_bssid(&mut self, bssid: Bssid) {
        if self.bssids.contains(&bssid) {
            return;
        }
        if self.bssids.push(bssid).is_err() {
            log::warn!("connman: disallow list full, ignoring bssid={}", bssid);
        }
    }

    pub fn add_ssid(&mut self, ssid: Ssid) {
        if self.ssids.contains(&ssid) {
            return;
        }
        if let Err(ssid) = self.ssids.push(ssid) {
            log::warn!("connman: disallow list full, ignoring ssid={}", ssid);
        }
    }

    pub fn contains_bssid(&self, bssid: &Bssid) -> bool {
        self.bssids.contains(bssid)
    }

    pub fn contains_ssid(&self, ssid: &Ssid) -> bool {
        self.ssids.contains(ssid)
    }

    pub fn blocks(&self, bssid: &Bssid, ssid: &Ssid) -> bool {
        self.contains_bssid(bssid) || self.contains_ssid(ssid)
    }

    pub fn is_empty(&self) -> bool {
        self.bssids.is_empty() && self.ssids.is_empty()
    }
}
