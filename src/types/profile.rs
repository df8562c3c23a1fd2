use core::fmt;

use heapless::Vec;

use super::{Bssid, SecurityPolicy, Ssid};

pub const PROFILE_FREQ_LIST_MAX: usize = 16;
pub const PROFILE_BSSID_LIST_MAX: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ProfileId(pub u16);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ProfileMode {
    #[default]
    Infrastructure,
    Ibss,
    Mesh,
    Ap,
    P2pGo,
}

impl ProfileMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Infrastructure => "infrastructure",
            Self::Ibss => "ibss",
            Self::Mesh => "mesh",
            Self::Ap => "ap",
            Self::P2pGo => "p2p_go",
        }
    }

    /// Modes that can start a network without a scanned peer.
    pub const fn can_create_network(self) -> bool {
        matches!(self, Self::Ibss | Self::Ap | Self::Mesh)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PbssPolicy {
    #[default]
    EssOnly,
    PbssOnly,
    Any,
}

/// Operator-configured description of a network the client may join.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkProfile {
    pub id: ProfileId,
    pub ssid: Ssid,
    pub priority: i32,
    pub security: SecurityPolicy,
    pub mode: ProfileMode,
    pub pbss: PbssPolicy,
    pub bssid: Option<Bssid>,
    pub fixed_freq_mhz: Option<u32>,
    pub freq_list: Vec<u32, PROFILE_FREQ_LIST_MAX>,
    pub bssid_blacklist: Vec<Bssid, PROFILE_BSSID_LIST_MAX>,
    pub bssid_whitelist: Vec<Bssid, PROFILE_BSSID_LIST_MAX>,
    pub enabled: bool,
    pub disabled_until_ms: Option<u64>,
}

impl NetworkProfile {
    pub fn new(id: ProfileId, ssid: Ssid) -> Self {
        Self {
            id,
            ssid,
            priority: 0,
            security: SecurityPolicy::default(),
            mode: ProfileMode::Infrastructure,
            pbss: PbssPolicy::EssOnly,
            bssid: None,
            fixed_freq_mhz: None,
            freq_list: Vec::new(),
            bssid_blacklist: Vec::new(),
            bssid_whitelist: Vec::new(),
            enabled: true,
            disabled_until_ms: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_security(mut self, security: SecurityPolicy) -> Self {
        self.security = security;
        self
    }

    pub fn with_mode(mut self, mode: ProfileMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_bssid(mut self, bssid: Bssid) -> Self {
        self.bssid = Some(bssid);
        self
    }

    pub fn temp_disabled(&self, now_ms: u64) -> bool {
        self.disabled_until_ms.is_some_and(|until| now_ms < until)
    }

    /// Enabled and not inside a temporary-disable window.
    pub fn usable(&self, now_ms: u64) -> bool {
        self.enabled && !self.temp_disabled(now_ms)
    }
}
