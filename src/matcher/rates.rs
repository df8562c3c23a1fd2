use heapless::Vec;

use crate::types::{Band, BssRecord, PhySelector};

pub const HW_MODES_MAX: usize = 4;
pub const HW_RATES_MAX: usize = 16;

/// Rates and PHY capabilities the local radio offers on one band.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HwMode {
    pub band: Band,
    /// Supported rates in 500 kb/s units.
    pub rates: Vec<u8, HW_RATES_MAX>,
    pub ht: bool,
    pub vht: bool,
    pub he: bool,
}

impl HwMode {
    pub fn new(band: Band, rates: &[u8]) -> Self {
        let mut mode = Self {
            band,
            rates: Vec::new(),
            ht: false,
            vht: false,
            he: false,
        };
        for rate in rates.iter().take(HW_RATES_MAX) {
            let _ = mode.rates.push(*rate);
        }
        mode
    }

    pub fn with_ht(mut self) -> Self {
        self.ht = true;
        self
    }

    pub fn with_vht(mut self) -> Self {
        self.vht = true;
        self
    }

    pub fn with_he(mut self) -> Self {
        self.he = true;
        self
    }

    fn supports_selector(&self, selector: PhySelector, sae_profile: bool) -> bool {
        match selector {
            PhySelector::Ht => self.ht,
            PhySelector::Vht => self.vht,
            PhySelector::He => self.he,
            PhySelector::SaeH2e => sae_profile,
        }
    }
}

/// Hardware mode table reported by the radio. An empty table accepts every BSS.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HwModeTable {
    modes: Vec<HwMode, HW_MODES_MAX>,
}

impl HwModeTable {
    pub const fn new() -> Self {
        Self { modes: Vec::new() }
    }

    /// 802.11b/g on 2.4 GHz and 802.11a on 5 GHz, both with HT.
    pub fn dual_band_ht() -> Self {
        let mut table = Self::new();
        table.insert(
            HwMode::new(
                Band::Band2_4GHz,
                &[2, 4, 11, 22, 12, 18, 24, 36, 48, 72, 96, 108],
            )
            .with_ht(),
        );
        table.insert(HwMode::new(Band::Band5GHz, &[12, 18, 24, 36, 48, 72, 96, 108]).with_ht());
        table
    }

    /// Adds or replaces the mode for its band.
    pub fn insert(&mut self, mode: HwMode) {
        if let Some(existing) = self.modes.iter_mut().find(|m| m.band == mode.band) {
            *existing = mode;
            return;
        }
        if self.modes.push(mode).is_err() {
            log::warn!("connman: hw mode table full");
        }
    }

    pub fn mode_for(&self, band: Band) -> Option<&HwMode> {
        self.modes.iter().find(|mode| mode.band == band)
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn supports(&self, bss: &BssRecord, sae_profile: bool) -> bool {
        if self.modes.is_empty() || bss.freq_mhz == 0 {
            return true;
        }
        let Some(mode) = self.mode_for(bss.band()) else {
            return false;
        };
        if !bss.basic_rates.iter().all(|rate| mode.rates.contains(rate)) {
            return false;
        }
        bss.selectors
            .iter()
            .all(|selector| mode.supports_selector(selector, sae_profile))
    }
}
