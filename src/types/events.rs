use heapless::Vec;

use super::{BssRecord, Bssid, ProfileId};

pub const SCAN_RESULTS_MAX: usize = 32;

pub type ScanBatch = Vec<BssRecord, SCAN_RESULTS_MAX>;

/// Asynchronous notifications from the driver/radio, already decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriverEvent {
    ScanResults(ScanBatch),
    AuthSuccess {
        bssid: Bssid,
    },
    AssocSuccess {
        bssid: Bssid,
    },
    AssocReject {
        bssid: Bssid,
        status_code: u16,
        timed_out: bool,
    },
    Disassoc {
        bssid: Bssid,
        reason: u16,
        locally_generated: bool,
    },
    Deauth {
        bssid: Bssid,
        reason: u16,
        locally_generated: bool,
    },
    MichaelMicFailure {
        unicast: bool,
    },
    HandshakeStarted,
    PortAuthorized,
    InterfaceEnabled,
    InterfaceDisabled,
}

impl DriverEvent {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ScanResults(_) => "scan_results",
            Self::AuthSuccess { .. } => "auth",
            Self::AssocSuccess { .. } => "assoc",
            Self::AssocReject { .. } => "assoc_reject",
            Self::Disassoc { .. } => "disassoc",
            Self::Deauth { .. } => "deauth",
            Self::MichaelMicFailure { .. } => "michael_mic_failure",
            Self::HandshakeStarted => "handshake_started",
            Self::PortAuthorized => "port_authorized",
            Self::InterfaceEnabled => "interface_enabled",
            Self::InterfaceDisabled => "interface_disabled",
        }
    }
}

/// Commands issued to the driver/radio. Fire-and-forget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RadioCommand {
    Connect { bssid: Bssid, profile: ProfileId },
    StartNetwork { profile: ProfileId },
    Deauthenticate { reason: u16 },
    SetCountermeasures(bool),
    StartScan,
}

impl RadioCommand {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::StartNetwork { .. } => "start_network",
            Self::Deauthenticate { .. } => "deauthenticate",
            Self::SetCountermeasures(_) => "set_countermeasures",
            Self::StartScan => "start_scan",
        }
    }
}
