use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use enumset::EnumSet;
use serde::Deserialize;
use wifi_connman::{
    config::ConnPolicy,
    types::{
        BssCapability, BssRecord, BssSecurity, KeyMgmt, NetworkProfile, ProfileId, ProfileMode,
        ScanBatch, SecurityIe, SecurityPolicy, SCAN_RESULTS_MAX,
    },
    Bssid, DriverEvent, ProfileTable, Ssid,
};

/// A replay script: profiles, optional policy overrides and a timeline.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub policy: PolicyOverrides,
    #[serde(default, rename = "profile")]
    pub profiles: Vec<ProfileSpec>,
    #[serde(default)]
    pub radio: RadioSpec,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyOverrides {
    pub connect_timeout_ms: Option<u32>,
    pub scan_interval_ms: Option<u32>,
    pub disconnect_rescan_ms: Option<u32>,
    pub bss_freshness_ms: Option<u32>,
    pub roam_threshold: Option<u8>,
    pub roam_hysteresis: Option<u8>,
    pub conn_failure_disable_after: Option<u8>,
}

impl PolicyOverrides {
    pub fn apply(&self, base: ConnPolicy) -> ConnPolicy {
        ConnPolicy {
            connect_timeout_ms: self.connect_timeout_ms.unwrap_or(base.connect_timeout_ms),
            scan_interval_ms: self.scan_interval_ms.unwrap_or(base.scan_interval_ms),
            disconnect_rescan_ms: self
                .disconnect_rescan_ms
                .unwrap_or(base.disconnect_rescan_ms),
            bss_freshness_ms: self.bss_freshness_ms.unwrap_or(base.bss_freshness_ms),
            roam_threshold: self.roam_threshold.unwrap_or(base.roam_threshold),
            roam_hysteresis: self.roam_hysteresis.unwrap_or(base.roam_hysteresis),
            conn_failure_disable_after: self
                .conn_failure_disable_after
                .unwrap_or(base.conn_failure_disable_after),
        }
        .sanitized()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileSpec {
    pub id: u16,
    pub ssid: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_profile_security")]
    pub security: String,
    /// Key-management labels such as "WPS" or "OWE"; replaces the preset's set.
    #[serde(default)]
    pub key_mgmt: Vec<String>,
    #[serde(default = "default_mode")]
    pub mode: String,
    pub bssid: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RadioSpec {
    /// Candidates the driver flags with a previous-BSSID mismatch.
    #[serde(default)]
    pub prev_bssid_mismatch: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BssSpec {
    pub bssid: String,
    pub ssid: String,
    #[serde(default = "default_freq")]
    pub freq_mhz: u32,
    pub signal_dbm: i16,
    #[serde(default = "default_bss_security")]
    pub security: String,
}

#[derive(Debug, Deserialize)]
pub struct Step {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: StepAction,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StepAction {
    Scan {
        #[serde(default)]
        bss: Vec<BssSpec>,
    },
    Auth {
        bssid: String,
    },
    Assoc {
        bssid: String,
    },
    AssocReject {
        bssid: String,
        #[serde(default = "default_status")]
        status_code: u16,
        #[serde(default)]
        timed_out: bool,
    },
    Disassoc {
        bssid: String,
        reason: u16,
        #[serde(default)]
        locally_generated: bool,
    },
    Deauth {
        bssid: String,
        reason: u16,
        #[serde(default)]
        locally_generated: bool,
    },
    MicFailure {
        #[serde(default = "default_enabled")]
        unicast: bool,
    },
    HandshakeStarted,
    PortAuthorized,
    InterfaceEnabled,
    InterfaceDisabled,
    /// Overrides what the radio reports as its BSSID; "none" restores tracking.
    ReportBssid {
        bssid: String,
    },
    Poll,
    RequestDisconnect,
    RequestReconnect,
    ClearBlacklist,
    RoamParams {
        threshold: u8,
        hysteresis: u8,
    },
    SetProfile {
        id: u16,
        enabled: bool,
    },
    RemoveProfile {
        id: u16,
    },
}

fn default_profile_security() -> String {
    "wpa2-psk".into()
}

fn default_bss_security() -> String {
    "wpa2-psk".into()
}

fn default_mode() -> String {
    "infrastructure".into()
}

fn default_enabled() -> bool {
    true
}

fn default_freq() -> u32 {
    2_437
}

fn default_status() -> u16 {
    1
}

pub fn load_script(path: &Path) -> Result<Script> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading script {}", path.display()))?;
    parse_script(&raw).with_context(|| format!("failed parsing script {}", path.display()))
}

pub fn parse_script(raw: &str) -> Result<Script> {
    let script: Script = toml::from_str(raw)?;
    let mut last_ms = 0;
    for (idx, step) in script.steps.iter().enumerate() {
        if step.at_ms < last_ms {
            bail!(
                "step {} at {} ms goes back in time (previous {} ms)",
                idx,
                step.at_ms,
                last_ms
            );
        }
        last_ms = step.at_ms;
    }
    Ok(script)
}

pub fn parse_bssid(value: &str) -> Result<Bssid> {
    Bssid::parse(value).map_err(|err| anyhow!("invalid bssid '{value}': {err}"))
}

pub fn parse_ssid(value: &str) -> Result<Ssid> {
    Ssid::from_text(value).ok_or_else(|| anyhow!("ssid '{value}' longer than 32 bytes"))
}

pub fn build_profiles(specs: &[ProfileSpec]) -> Result<ProfileTable> {
    let mut table = ProfileTable::new();
    for spec in specs {
        let mut security = match spec.security.as_str() {
            "open" => SecurityPolicy::open(),
            "wep" => SecurityPolicy::wep(),
            "wpa2-psk" => SecurityPolicy::wpa2_psk(),
            "sae" => SecurityPolicy::sae(),
            other => bail!("profile {}: unknown security '{other}'", spec.id),
        };
        if !spec.key_mgmt.is_empty() {
            security.key_mgmt = parse_key_mgmt(spec.id, &spec.key_mgmt)?;
        }
        let mode = match spec.mode.as_str() {
            "infrastructure" => ProfileMode::Infrastructure,
            "ibss" => ProfileMode::Ibss,
            "mesh" => ProfileMode::Mesh,
            "ap" => ProfileMode::Ap,
            other => bail!("profile {}: unknown mode '{other}'", spec.id),
        };
        let mut profile = NetworkProfile::new(ProfileId(spec.id), parse_ssid(&spec.ssid)?)
            .with_priority(spec.priority)
            .with_security(security)
            .with_mode(mode);
        if let Some(bssid) = &spec.bssid {
            profile = profile.with_bssid(parse_bssid(bssid)?);
        }
        profile.enabled = spec.enabled;
        table
            .insert(profile)
            .map_err(|err| anyhow!("profile {}: {err}", spec.id))?;
    }
    Ok(table)
}

fn parse_key_mgmt(id: u16, labels: &[String]) -> Result<EnumSet<KeyMgmt>> {
    let mut set = EnumSet::new();
    for label in labels {
        let key_mgmt = KeyMgmt::from_label(label)
            .ok_or_else(|| anyhow!("profile {id}: unknown key_mgmt '{label}'"))?;
        set.insert(key_mgmt);
    }
    Ok(set)
}

pub fn build_record(spec: &BssSpec) -> Result<BssRecord> {
    let record = BssRecord::new(
        parse_bssid(&spec.bssid)?,
        parse_ssid(&spec.ssid)?,
        spec.freq_mhz,
        spec.signal_dbm,
    );
    let record = match spec.security.as_str() {
        "open" => record
            .with_caps(BssCapability::Ess.into())
            .with_security(BssSecurity::open()),
        "wep" => record.with_caps(BssCapability::Ess | BssCapability::Privacy),
        "wpa-psk" => record
            .with_caps(BssCapability::Ess | BssCapability::Privacy)
            .with_security(BssSecurity {
                wpa: Some(SecurityIe::wpa_psk_tkip()),
                ..BssSecurity::open()
            }),
        "wpa2-psk" => record
            .with_caps(BssCapability::Ess | BssCapability::Privacy)
            .with_security(BssSecurity {
                rsn: Some(SecurityIe::rsn_psk_ccmp()),
                ..BssSecurity::open()
            }),
        other => bail!("bss {}: unknown security '{other}'", spec.bssid),
    };
    Ok(record)
}

/// Turns a step into a driver event; `None` for steps that are not driver events.
pub fn driver_event(action: &StepAction) -> Result<Option<DriverEvent>> {
    let event = match action {
        StepAction::Scan { bss } => {
            let mut batch = ScanBatch::new();
            for spec in bss {
                batch
                    .push(build_record(spec)?)
                    .map_err(|_| anyhow!("scan batch holds at most {SCAN_RESULTS_MAX} records"))?;
            }
            DriverEvent::ScanResults(batch)
        }
        StepAction::Auth { bssid } => DriverEvent::AuthSuccess {
            bssid: parse_bssid(bssid)?,
        },
        StepAction::Assoc { bssid } => DriverEvent::AssocSuccess {
            bssid: parse_bssid(bssid)?,
        },
        StepAction::AssocReject {
            bssid,
            status_code,
            timed_out,
        } => DriverEvent::AssocReject {
            bssid: parse_bssid(bssid)?,
            status_code: *status_code,
            timed_out: *timed_out,
        },
        StepAction::Disassoc {
            bssid,
            reason,
            locally_generated,
        } => DriverEvent::Disassoc {
            bssid: parse_bssid(bssid)?,
            reason: *reason,
            locally_generated: *locally_generated,
        },
        StepAction::Deauth {
            bssid,
            reason,
            locally_generated,
        } => DriverEvent::Deauth {
            bssid: parse_bssid(bssid)?,
            reason: *reason,
            locally_generated: *locally_generated,
        },
        StepAction::MicFailure { unicast } => DriverEvent::MichaelMicFailure { unicast: *unicast },
        StepAction::HandshakeStarted => DriverEvent::HandshakeStarted,
        StepAction::PortAuthorized => DriverEvent::PortAuthorized,
        StepAction::InterfaceEnabled => DriverEvent::InterfaceEnabled,
        StepAction::InterfaceDisabled => DriverEvent::InterfaceDisabled,
        StepAction::ReportBssid { .. }
        | StepAction::Poll
        | StepAction::RequestDisconnect
        | StepAction::RequestReconnect
        | StepAction::ClearBlacklist
        | StepAction::RoamParams { .. }
        | StepAction::SetProfile { .. }
        | StepAction::RemoveProfile { .. } => return Ok(None),
    };
    Ok(Some(event))
}
