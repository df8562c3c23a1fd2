use heapless::Vec;

use crate::{config::BLACKLIST_CAPACITY, types::Bssid};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlacklistEntry {
    pub bssid: Bssid,
    pub count: u16,
    pub first_ms: u64,
    pub updated_ms: u64,
}

/// Failure counts per BSSID. A BSSID is rejected once its count exceeds the limit.
#[derive(Clone, Debug, Default)]
pub struct Blacklist {
    entries: Vec<BlacklistEntry, BLACKLIST_CAPACITY>,
}

impl Blacklist {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// With a single enabled profile, one failure is tolerated before rejecting.
    pub const fn limit_for(enabled_profiles: usize) -> u16 {
        if enabled_profiles == 1 {
            1
        } else {
            0
        }
    }

    /// Records one failure and returns the updated count.
    pub fn add(&mut self, bssid: Bssid, now_ms: u64) -> u16 {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.bssid == bssid) {
            entry.count = entry.count.saturating_add(1);
            entry.updated_ms = now_ms;
            return entry.count;
        }

        let entry = BlacklistEntry {
            bssid,
            count: 1,
            first_ms: now_ms,
            updated_ms: now_ms,
        };
        if let Err(entry) = self.entries.push(entry) {
            if let Some(oldest) = self
                .entries
                .iter_mut()
                .min_by_key(|existing| existing.updated_ms)
            {
                log::debug!("connman: blacklist full, replacing bssid={}", oldest.bssid);
                *oldest = entry;
            }
        }
        1
    }

    pub fn get(&self, bssid: &Bssid) -> Option<&BlacklistEntry> {
        self.entries.iter().find(|entry| entry.bssid == *bssid)
    }

    pub fn is_blacklisted(&self, bssid: &Bssid, limit: u16) -> bool {
        self.get(bssid).is_some_and(|entry| entry.count > limit)
    }

    pub fn remove(&mut self, bssid: &Bssid) -> bool {
        match self.entries.iter().position(|entry| entry.bssid == *bssid) {
            Some(idx) => {
                self.entries.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlacklistEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bssid(last: u8) -> Bssid {
        Bssid::new([0x02, 0, 0, 0, 0, last])
    }

    #[test]
    fn add_counts_failures_per_bssid() {
        let mut blacklist = Blacklist::new();
        assert_eq!(blacklist.add(bssid(1), 10), 1);
        assert_eq!(blacklist.add(bssid(1), 20), 2);
        assert_eq!(blacklist.add(bssid(2), 30), 1);

        let entry = blacklist.get(&bssid(1)).unwrap();
        assert_eq!(entry.first_ms, 10);
        assert_eq!(entry.updated_ms, 20);
        assert_eq!(blacklist.len(), 2);
    }

    #[test]
    fn rejection_depends_on_limit() {
        let mut blacklist = Blacklist::new();
        blacklist.add(bssid(1), 0);
        assert!(blacklist.is_blacklisted(&bssid(1), Blacklist::limit_for(3)));
        assert!(!blacklist.is_blacklisted(&bssid(1), Blacklist::limit_for(1)));
        blacklist.add(bssid(1), 1);
        assert!(blacklist.is_blacklisted(&bssid(1), Blacklist::limit_for(1)));
        assert!(!blacklist.is_blacklisted(&bssid(9), 0));
    }

    #[test]
    fn full_blacklist_replaces_least_recently_updated() {
        let mut blacklist = Blacklist::new();
        for idx in 0..BLACKLIST_CAPACITY as u8 {
            blacklist.add(bssid(idx), 100 + u64::from(idx));
        }
        blacklist.add(bssid(0), 500);

        blacklist.add(bssid(200), 600);

        assert_eq!(blacklist.len(), BLACKLIST_CAPACITY);
        assert!(blacklist.get(&bssid(1)).is_none());
        assert!(blacklist.get(&bssid(0)).is_some());
        assert!(blacklist.get(&bssid(200)).is_some());
    }

    #[test]
    fn remove_and_clear() {
        let mut blacklist = Blacklist::new();
        blacklist.add(bssid(1), 0);
        blacklist.add(bssid(2), 0);
        assert!(blacklist.remove(&bssid(1)));
        assert!(!blacklist.remove(&bssid(1)));
        blacklist.clear();
        assert!(blacklist.is_empty());
    }
}
