mod rates;
mod security;

#[cfg(test)]
mod tests;

use enumset::enum_set;

use crate::{
    blacklist::Blacklist,
    disallow::DisallowList,
    types::{BssCapability, BssRecord, KeyMgmt, NetworkProfile, PbssPolicy, ProfileMode},
};

pub use rates::{HwMode, HwModeTable, HW_MODES_MAX, HW_RATES_MAX};

/// The independent predicates a candidate must pass, in evaluation order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum MatchCheck {
    GlobalBlacklist = 1,
    ProfileEnabled = 2,
    Disallowed = 3,
    Ssid = 4,
    FixedBssid = 5,
    ProfileBssidLists = 6,
    Security = 7,
    Mode = 8,
    FrequencyList = 9,
    RateSet = 10,
    ScanRecency = 11,
}

impl MatchCheck {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GlobalBlacklist => "global_blacklist",
            Self::ProfileEnabled => "profile_enabled",
            Self::Disallowed => "disallowed",
            Self::Ssid => "ssid",
            Self::FixedBssid => "fixed_bssid",
            Self::ProfileBssidLists => "profile_bssid_lists",
            Self::Security => "security",
            Self::Mode => "mode",
            Self::FrequencyList => "frequency_list",
            Self::RateSet => "rate_set",
            Self::ScanRecency => "scan_recency",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum RejectReason {
    #[default]
    None = 0,
    Blacklisted = 1,
    ProfileDisabled = 2,
    ProfileTempDisabled = 3,
    DisallowedBssid = 4,
    DisallowedSsid = 5,
    SsidMismatch = 6,
    WildcardNotPermitted = 7,
    BssidMismatch = 8,
    ProfileBlacklisted = 9,
    NotWhitelisted = 10,
    PrivacyMismatch = 11,
    NoPairwiseCipher = 12,
    GroupCipherMismatch = 13,
    KeyMgmtMismatch = 14,
    MfpUnsupported = 15,
    NonWpaNotAllowed = 16,
    WpaForWepProfile = 17,
    NotEssOrPbss = 18,
    PbssMismatch = 19,
    IbssSecurityUnsupported = 20,
    FrequencyMismatch = 21,
    ModeMismatch = 22,
    FrequencyNotAllowed = 23,
    RateSetUnsupported = 24,
    Stale = 25,
}

impl RejectReason {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Blacklisted => "blacklisted",
            Self::ProfileDisabled => "profile_disabled",
            Self::ProfileTempDisabled => "profile_temp_disabled",
            Self::DisallowedBssid => "disallowed_bssid",
            Self::DisallowedSsid => "disallowed_ssid",
            Self::SsidMismatch => "ssid_mismatch",
            Self::WildcardNotPermitted => "wildcard_not_permitted",
            Self::BssidMismatch => "bssid_mismatch",
            Self::ProfileBlacklisted => "profile_blacklisted",
            Self::NotWhitelisted => "not_whitelisted",
            Self::PrivacyMismatch => "privacy_mismatch",
            Self::NoPairwiseCipher => "no_pairwise_cipher",
            Self::GroupCipherMismatch => "group_cipher_mismatch",
            Self::KeyMgmtMismatch => "key_mgmt_mismatch",
            Self::MfpUnsupported => "mfp_unsupported",
            Self::NonWpaNotAllowed => "non_wpa_not_allowed",
            Self::WpaForWepProfile => "wpa_for_wep_profile",
            Self::NotEssOrPbss => "not_ess_or_pbss",
            Self::PbssMismatch => "pbss_mismatch",
            Self::IbssSecurityUnsupported => "ibss_security_unsupported",
            Self::FrequencyMismatch => "frequency_mismatch",
            Self::ModeMismatch => "mode_mismatch",
            Self::FrequencyNotAllowed => "frequency_not_allowed",
            Self::RateSetUnsupported => "rate_set_unsupported",
            Self::Stale => "stale",
        }
    }

    /// The check that produced this reason. `None` is not produced by any check.
    pub const fn check(self) -> Option<MatchCheck> {
        Some(match self {
            Self::None => return None,
            Self::Blacklisted => MatchCheck::GlobalBlacklist,
            Self::ProfileDisabled | Self::ProfileTempDisabled => MatchCheck::ProfileEnabled,
            Self::DisallowedBssid | Self::DisallowedSsid => MatchCheck::Disallowed,
            Self::SsidMismatch | Self::WildcardNotPermitted => MatchCheck::Ssid,
            Self::BssidMismatch => MatchCheck::FixedBssid,
            Self::ProfileBlacklisted | Self::NotWhitelisted => MatchCheck::ProfileBssidLists,
            Self::PrivacyMismatch
            | Self::NoPairwiseCipher
            | Self::GroupCipherMismatch
            | Self::KeyMgmtMismatch
            | Self::MfpUnsupported
            | Self::NonWpaNotAllowed
            | Self::WpaForWepProfile => MatchCheck::Security,
            Self::NotEssOrPbss
            | Self::PbssMismatch
            | Self::IbssSecurityUnsupported
            | Self::FrequencyMismatch
            | Self::ModeMismatch => MatchCheck::Mode,
            Self::FrequencyNotAllowed => MatchCheck::FrequencyList,
            Self::RateSetUnsupported => MatchCheck::RateSet,
            Self::Stale => MatchCheck::ScanRecency,
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchResult {
    Accept,
    Reject(RejectReason),
}

impl MatchResult {
    pub const fn accepted(self) -> bool {
        matches!(self, Self::Accept)
    }

    pub const fn reason(self) -> Option<RejectReason> {
        match self {
            Self::Accept => None,
            Self::Reject(reason) => Some(reason),
        }
    }
}

/// Everything besides the record and the profile that a match depends on.
#[derive(Clone, Copy, Debug)]
pub struct MatchContext<'a> {
    pub now_ms: u64,
    pub blacklist: &'a Blacklist,
    pub blacklist_limit: u16,
    pub disallowed: &'a DisallowList,
    pub hw_modes: &'a HwModeTable,
    pub freshness_ms: u32,
}

/// Decides whether `bss` is an acceptable candidate for `profile`.
pub fn matches(bss: &BssRecord, profile: &NetworkProfile, ctx: &MatchContext<'_>) -> MatchResult {
    match run_checks(bss, profile, ctx) {
        Ok(()) => MatchResult::Accept,
        Err(reason) => MatchResult::Reject(reason),
    }
}

fn run_checks(
    bss: &BssRecord,
    profile: &NetworkProfile,
    ctx: &MatchContext<'_>,
) -> Result<(), RejectReason> {
    if ctx.blacklist.is_blacklisted(&bss.bssid, ctx.blacklist_limit) {
        return Err(RejectReason::Blacklisted);
    }

    if !profile.enabled {
        return Err(RejectReason::ProfileDisabled);
    }
    if profile.temp_disabled(ctx.now_ms) {
        return Err(RejectReason::ProfileTempDisabled);
    }

    if ctx.disallowed.contains_bssid(&bss.bssid) {
        return Err(RejectReason::DisallowedBssid);
    }
    if ctx.disallowed.contains_ssid(&bss.ssid) {
        return Err(RejectReason::DisallowedSsid);
    }

    check_ssid(bss, profile)?;

    if profile.bssid.is_some_and(|pinned| pinned != bss.bssid) {
        return Err(RejectReason::BssidMismatch);
    }

    if profile.bssid_blacklist.contains(&bss.bssid) {
        return Err(RejectReason::ProfileBlacklisted);
    }
    if !profile.bssid_whitelist.is_empty() && !profile.bssid_whitelist.contains(&bss.bssid) {
        return Err(RejectReason::NotWhitelisted);
    }

    security::check_security(bss, &profile.security)?;

    check_mode(bss, profile)?;

    if !profile.freq_list.is_empty() && !profile.freq_list.contains(&bss.freq_mhz) {
        return Err(RejectReason::FrequencyNotAllowed);
    }

    if !ctx.hw_modes.supports(bss, profile.security.uses_sae()) {
        return Err(RejectReason::RateSetUnsupported);
    }

    if ctx.now_ms.saturating_sub(bss.last_seen_ms) > u64::from(ctx.freshness_ms) {
        return Err(RejectReason::Stale);
    }

    Ok(())
}

fn check_ssid(bss: &BssRecord, profile: &NetworkProfile) -> Result<(), RejectReason> {
    if profile.ssid.is_empty() {
        let pinned_here = profile.bssid == Some(bss.bssid);
        let wps_enrollment = profile.security.key_mgmt.contains(KeyMgmt::Wps)
            && bss.security.wps_open_enrollment;
        return if pinned_here || wps_enrollment {
            Ok(())
        } else {
            Err(RejectReason::WildcardNotPermitted)
        };
    }
    if bss.ssid != profile.ssid {
        return Err(RejectReason::SsidMismatch);
    }
    Ok(())
}

fn check_mode(bss: &BssRecord, profile: &NetworkProfile) -> Result<(), RejectReason> {
    let caps = bss.caps;
    match profile.mode {
        ProfileMode::Infrastructure => {
            let pbss = caps.contains(BssCapability::Pbss);
            if !caps.contains(BssCapability::Ess) && !pbss {
                return Err(RejectReason::NotEssOrPbss);
            }
            let agrees = match profile.pbss {
                PbssPolicy::EssOnly => !pbss,
                PbssPolicy::PbssOnly => pbss,
                PbssPolicy::Any => true,
            };
            if !agrees {
                return Err(RejectReason::PbssMismatch);
            }
            Ok(())
        }
        ProfileMode::Ibss => {
            if !caps.contains(BssCapability::Ibss) {
                return Err(RejectReason::ModeMismatch);
            }
            if profile
                .security
                .key_mgmt
                .is_disjoint(enum_set!(KeyMgmt::None | KeyMgmt::WpaNone))
            {
                return Err(RejectReason::IbssSecurityUnsupported);
            }
            check_fixed_freq(bss, profile)
        }
        ProfileMode::Mesh => {
            if !caps.contains(BssCapability::Mesh) {
                return Err(RejectReason::ModeMismatch);
            }
            check_fixed_freq(bss, profile)
        }
        ProfileMode::Ap | ProfileMode::P2pGo => Err(RejectReason::ModeMismatch),
    }
}

fn check_fixed_freq(bss: &BssRecord, profile: &NetworkProfile) -> Result<(), RejectReason> {
    match profile.fixed_freq_mhz {
        Some(freq) if freq != bss.freq_mhz => Err(RejectReason::FrequencyMismatch),
        _ => Ok(()),
    }
}
