use heapless::Vec;

use crate::{
    config::CATALOG_CAPACITY,
    types::{BssRecord, Bssid},
};


/// Scan results keyed by BSSID, kept in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct BssCatalog {
    records: Vec<BssRecord, CATALOG_CAPACITY>,
}

impl BssCatalog {
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Inserts or replaces by BSSID. When full, the weakest record is dropped,
    /// which may be the incoming one.
    pub fn upsert(&mut self, record: BssRecord) {
        if let Some(slot) = self
            .records
            .iter_mut()
            .find(|existing| existing.bssid == record.bssid)
        {
            *slot = record;
            return;
        }

        if let Err(record) = self.records.push(record) {
            let Some((weakest_idx, weakest)) = self
                .records
                .iter()
                .enumerate()
                .min_by_key(|(_, existing)| existing.signal_dbm)
            else {
                return;
            };
            if weakest.signal_dbm >= record.signal_dbm {
                log::debug!(
                    "connman: catalog full, dropping incoming bssid={} signal={}",
                    record.bssid,
                    record.signal_dbm
                );
                return;
            }
            log::debug!(
                "connman: catalog full, evicting bssid={} signal={}",
                weakest.bssid,
                weakest.signal_dbm
            );
            self.records.remove(weakest_idx);
            let _ = self.records.push(record);
        }
    }

    /// Upserts a scan batch. Records without a timestamp get the scan time.
    pub fn apply_scan<'a, I>(&mut self, records: I, now_ms: u64) -> usize
    where
        I: IntoIterator<Item = &'a BssRecord>,
    {
        let mut applied = 0;
        for record in records {
            let mut record = record.clone();
            if record.last_seen_ms == 0 {
                record.last_seen_ms = now_ms;
            }
            self.upsert(record);
            applied += 1;
        }
        applied
    }

    pub fn get_by_bssid(&self, bssid: &Bssid) -> Option<&BssRecord> {
        self.records.iter().find(|record| record.bssid == *bssid)
    }

    pub fn remove(&mut self, bssid: &Bssid) -> Option<BssRecord> {
        let idx = self
            .records
            .iter()
            .position(|record| record.bssid == *bssid)?;
        Some(self.records.remove(idx))
    }

    pub fn flush(&mut self) {
        self.records.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &BssRecord> + Clone {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
