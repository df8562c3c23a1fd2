pub mod channels;

// Policy baselines and clamps for the station connection core.
//
// Timing constants follow the supplicant defaults the radio firmware ships with:
// - 100ms rescan after losing an association, so the next join starts quickly.
// - 5s back-off between scans when nothing matched.
// - 60s TKIP countermeasure window (IEEE 802.11 section 12.7.4.1).
pub const CATALOG_CAPACITY: usize = 32;
pub const BLACKLIST_CAPACITY: usize = 16;
pub const PROFILE_CAPACITY: usize = 16;
pub const DISALLOW_CAPACITY: usize = 8;

pub const WIFI_CONNECT_TIMEOUT_DEFAULT_MS: u32 = 10_000;
pub const WIFI_SCAN_INTERVAL_DEFAULT_MS: u32 = 5_000;
pub const WIFI_DISCONNECT_RESCAN_DEFAULT_MS: u32 = 100;
// 30s: one slow full-band scan cycle plus margin; older entries describe APs we may have left.
pub const WIFI_BSS_FRESHNESS_DEFAULT_MS: u32 = 30_000;
pub const WIFI_COUNTERMEASURES_MS: u32 = 60_000;
// Magnitudes in dB: 75 means "stay put while the current AP is stronger than -75 dBm".
pub const WIFI_ROAM_THRESHOLD_DEFAULT: u8 = 75;
pub const WIFI_ROAM_HYSTERESIS_DEFAULT: u8 = 4;
pub const WIFI_ROAM_THRESHOLD_MAX: u8 = 100;
pub const WIFI_ROAM_HYSTERESIS_MAX: u8 = 90;

/// Rescan delay after the Nth consecutive failure against one BSSID.
pub const WIFI_FAILURE_RESCAN_MS: [u32; 5] = [100, 500, 1_000, 5_000, 10_000];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnPolicy {
    pub connect_timeout_ms: u32,
    pub scan_interval_ms: u32,
    pub disconnect_rescan_ms: u32,
    pub bss_freshness_ms: u32,
    /// Current-AP signal magnitude below which the selector keeps the link. 0 disables.
    pub roam_threshold: u8,
    /// Minimum signal gain in dB a roam candidate must offer.
    pub roam_hysteresis: u8,
    /// Consecutive failures on one BSSID before its profile is temporarily disabled.
    pub conn_failure_disable_after: u8,
}

impl ConnPolicy {
    pub const fn defaults() -> Self {
        Self {
            connect_timeout_ms: WIFI_CONNECT_TIMEOUT_DEFAULT_MS,
            scan_interval_ms: WIFI_SCAN_INTERVAL_DEFAULT_MS,
            disconnect_rescan_ms: WIFI_DISCONNECT_RESCAN_DEFAULT_MS,
            bss_freshness_ms: WIFI_BSS_FRESHNESS_DEFAULT_MS,
            roam_threshold: WIFI_ROAM_THRESHOLD_DEFAULT,
            roam_hysteresis: WIFI_ROAM_HYSTERESIS_DEFAULT,
            conn_failure_disable_after: 3,
        }
    }

    pub const fn sanitized(self) -> Self {
        Self {
            connect_timeout_ms: clamp_u32(self.connect_timeout_ms, 2_000, 180_000),
            scan_interval_ms: clamp_u32(self.scan_interval_ms, 500, 600_000),
            disconnect_rescan_ms: clamp_u32(self.disconnect_rescan_ms, 0, 10_000),
            bss_freshness_ms: clamp_u32(self.bss_freshness_ms, 1_000, 600_000),
            roam_threshold: clamp_u8(self.roam_threshold, 0, WIFI_ROAM_THRESHOLD_MAX),
            roam_hysteresis: clamp_u8(self.roam_hysteresis, 0, WIFI_ROAM_HYSTERESIS_MAX),
            conn_failure_disable_after: clamp_u8(self.conn_failure_disable_after, 1, 16),
        }
    }

    pub const fn failure_rescan_ms(count: u16) -> u32 {
        let idx = if count == 0 { 0 } else { count as usize - 1 };
        let last = WIFI_FAILURE_RESCAN_MS.len() - 1;
        WIFI_FAILURE_RESCAN_MS[if idx > last { last } else { idx }]
    }
}

impl Default for ConnPolicy {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Temporary-disable window in seconds for the given consecutive auth failure count.
pub const fn temp_disable_secs(auth_failures: u16) -> u32 {
    match auth_failures {
        0 | 1 => 10,
        2 => 20,
        3 => 30,
        4..=5 => 60,
        6..=10 => 90,
        11..=50 => 120,
        _ => 300,
    }
}

const fn clamp_u32(value: u32, min: u32, max: u32) -> u32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

const fn clamp_u8(value: u8, min: u8, max: u8) -> u8 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
