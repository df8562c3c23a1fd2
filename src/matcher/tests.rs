use enumset::{enum_set, EnumSet};

use super::{matches, HwMode, HwModeTable, MatchCheck, MatchContext, MatchResult, RejectReason};
use crate::{
    blacklist::Blacklist,
    disallow::DisallowList,
    types::{
        Band, BssCapability, BssRecord, BssSecurity, Bssid, Cipher, KeyMgmt, MfpPolicy,
        NetworkProfile, PbssPolicy, PhySelector, ProfileId, ProfileMode, Proto, SecurityIe,
        SecurityPolicy, Ssid,
    },
};

const NOW_MS: u64 = 100_000;

fn bssid(last: u8) -> Bssid {
    Bssid::new([0x02, 0x11, 0x22, 0x33, 0x44, last])
}

fn wpa2_bss() -> BssRecord {
    BssRecord::new(bssid(1), Ssid::from_text("home").unwrap(), 2_437, -55)
        .with_caps(BssCapability::Ess | BssCapability::Privacy)
        .with_security(BssSecurity {
            rsn: Some(SecurityIe::rsn_psk_ccmp()),
            ..BssSecurity::open()
        })
        .seen_at(NOW_MS)
}

fn open_bss() -> BssRecord {
    BssRecord::new(bssid(2), Ssid::from_text("cafe").unwrap(), 5_180, -60).seen_at(NOW_MS)
}

fn wpa2_profile() -> NetworkProfile {
    NetworkProfile::new(ProfileId(1), Ssid::from_text("home").unwrap())
}

fn open_profile() -> NetworkProfile {
    NetworkProfile::new(ProfileId(2), Ssid::from_text("cafe").unwrap())
        .with_security(SecurityPolicy::open())
}

struct Fixture {
    blacklist: Blacklist,
    disallowed: DisallowList,
    hw_modes: HwModeTable,
}

impl Fixture {
    fn new() -> Self {
        Self {
            blacklist: Blacklist::new(),
            disallowed: DisallowList::new(),
            hw_modes: HwModeTable::new(),
        }
    }

    fn ctx(&self) -> MatchContext<'_> {
        MatchContext {
            now_ms: NOW_MS,
            blacklist: &self.blacklist,
            blacklist_limit: 0,
            disallowed: &self.disallowed,
            hw_modes: &self.hw_modes,
            freshness_ms: 30_000,
        }
    }

    fn run(&self, bss: &BssRecord, profile: &NetworkProfile) -> MatchResult {
        matches(bss, profile, &self.ctx())
    }
}

fn assert_rejected(result: MatchResult, reason: RejectReason, check: MatchCheck) {
    assert_eq!(result, MatchResult::Reject(reason));
    assert_eq!(reason.check(), Some(check));
}

#[test]
fn baseline_pairs_are_accepted() {
    let fixture = Fixture::new();
    assert_eq!(fixture.run(&wpa2_bss(), &wpa2_profile()), MatchResult::Accept);
    assert_eq!(fixture.run(&open_bss(), &open_profile()), MatchResult::Accept);
}

#[test]
fn blacklisted_bssid_rejected_above_limit() {
    let mut fixture = Fixture::new();
    fixture.blacklist.add(bssid(1), 0);
    assert_rejected(
        fixture.run(&wpa2_bss(), &wpa2_profile()),
        RejectReason::Blacklisted,
        MatchCheck::GlobalBlacklist,
    );

    let mut ctx = fixture.ctx();
    ctx.blacklist_limit = 1;
    assert!(matches(&wpa2_bss(), &wpa2_profile(), &ctx).accepted());
}

#[test]
fn disabled_and_temp_disabled_profiles_rejected() {
    let fixture = Fixture::new();
    let mut disabled = wpa2_profile();
    disabled.enabled = false;
    assert_rejected(
        fixture.run(&wpa2_bss(), &disabled),
        RejectReason::ProfileDisabled,
        MatchCheck::ProfileEnabled,
    );

    let mut cooling = wpa2_profile();
    cooling.disabled_until_ms = Some(NOW_MS + 1);
    assert_rejected(
        fixture.run(&wpa2_bss(), &cooling),
        RejectReason::ProfileTempDisabled,
        MatchCheck::ProfileEnabled,
    );

    cooling.disabled_until_ms = Some(NOW_MS);
    assert!(fixture.run(&wpa2_bss(), &cooling).accepted());
}

#[test]
fn disallow_list_rejects_bssid_then_ssid() {
    let mut fixture = Fixture::new();
    fixture.disallowed = DisallowList::from_parts(&[bssid(1)], &[]);
    assert_rejected(
        fixture.run(&wpa2_bss(), &wpa2_profile()),
        RejectReason::DisallowedBssid,
        MatchCheck::Disallowed,
    );

    fixture.disallowed = DisallowList::from_parts(&[], &[Ssid::from_text("home").unwrap()]);
    assert_rejected(
        fixture.run(&wpa2_bss(), &wpa2_profile()),
        RejectReason::DisallowedSsid,
        MatchCheck::Disallowed,
    );
}

#[test]
fn ssid_must_match_exactly() {
    let fixture = Fixture::new();
    let profile = NetworkProfile::new(ProfileId(1), Ssid::from_text("Home").unwrap());
    assert_rejected(
        fixture.run(&wpa2_bss(), &profile),
        RejectReason::SsidMismatch,
        MatchCheck::Ssid,
    );

    let mut hidden = wpa2_bss();
    hidden.ssid = Ssid::empty();
    assert_rejected(
        fixture.run(&hidden, &wpa2_profile()),
        RejectReason::SsidMismatch,
        MatchCheck::Ssid,
    );
}

#[test]
fn wildcard_ssid_needs_pinned_bssid_or_wps_enrollment() {
    let fixture = Fixture::new();
    let wildcard = NetworkProfile::new(ProfileId(3), Ssid::empty());
    assert_rejected(
        fixture.run(&wpa2_bss(), &wildcard),
        RejectReason::WildcardNotPermitted,
        MatchCheck::Ssid,
    );

    let pinned = wildcard.clone().with_bssid(bssid(1));
    assert!(fixture.run(&wpa2_bss(), &pinned).accepted());

    let wps = NetworkProfile::new(ProfileId(4), Ssid::empty()).with_security(SecurityPolicy {
        key_mgmt: EnumSet::only(KeyMgmt::Wps),
        ..SecurityPolicy::open()
    });
    let mut enrolling = open_bss();
    enrolling.security.wps_open_enrollment = true;
    assert!(fixture.run(&enrolling, &wps).accepted());
    assert_rejected(
        fixture.run(&open_bss(), &wps),
        RejectReason::WildcardNotPermitted,
        MatchCheck::Ssid,
    );
}

#[test]
fn fixed_bssid_must_match() {
    let fixture = Fixture::new();
    let profile = wpa2_profile().with_bssid(bssid(9));
    assert_rejected(
        fixture.run(&wpa2_bss(), &profile),
        RejectReason::BssidMismatch,
        MatchCheck::FixedBssid,
    );
}

#[test]
fn profile_bssid_lists_apply() {
    let fixture = Fixture::new();
    let mut blocked = wpa2_profile();
    blocked.bssid_blacklist.push(bssid(1)).unwrap();
    assert_rejected(
        fixture.run(&wpa2_bss(), &blocked),
        RejectReason::ProfileBlacklisted,
        MatchCheck::ProfileBssidLists,
    );

    let mut allow_only = wpa2_profile();
    allow_only.bssid_whitelist.push(bssid(7)).unwrap();
    assert_rejected(
        fixture.run(&wpa2_bss(), &allow_only),
        RejectReason::NotWhitelisted,
        MatchCheck::ProfileBssidLists,
    );
    allow_only.bssid_whitelist.push(bssid(1)).unwrap();
    assert!(fixture.run(&wpa2_bss(), &allow_only).accepted());
}

#[test]
fn privacy_bit_must_agree_with_profile() {
    let fixture = Fixture::new();
    let mut open_wpa2_profile = open_profile();
    open_wpa2_profile.ssid = Ssid::from_text("home").unwrap();
    assert_rejected(
        fixture.run(&wpa2_bss(), &open_wpa2_profile),
        RejectReason::PrivacyMismatch,
        MatchCheck::Security,
    );

    let mut wpa2_for_cafe = wpa2_profile();
    wpa2_for_cafe.ssid = Ssid::from_text("cafe").unwrap();
    assert_rejected(
        fixture.run(&open_bss(), &wpa2_for_cafe),
        RejectReason::PrivacyMismatch,
        MatchCheck::Security,
    );
}

#[test]
fn wps_enrollment_ignores_protected_ap() {
    let fixture = Fixture::new();
    let wps = NetworkProfile::new(ProfileId(4), Ssid::empty()).with_security(SecurityPolicy {
        key_mgmt: EnumSet::only(KeyMgmt::Wps),
        ..SecurityPolicy::open()
    });
    let mut enrolling = wpa2_bss();
    enrolling.security.wps_open_enrollment = true;
    assert!(fixture.run(&enrolling, &wps).accepted());
}

#[test]
fn owe_profile_joins_open_ap() {
    let fixture = Fixture::new();
    let owe = open_profile().with_security(SecurityPolicy {
        key_mgmt: EnumSet::only(KeyMgmt::Owe),
        ..SecurityPolicy::open()
    });
    assert!(fixture.run(&open_bss(), &owe).accepted());
}

#[test]
fn rsn_cipher_and_key_mgmt_checks() {
    let fixture = Fixture::new();

    let mut gcmp_only = wpa2_bss();
    if let Some(rsn) = gcmp_only.security.rsn.as_mut() {
        rsn.pairwise = EnumSet::only(Cipher::Gcmp256);
    }
    assert_rejected(
        fixture.run(&gcmp_only, &wpa2_profile()),
        RejectReason::NoPairwiseCipher,
        MatchCheck::Security,
    );

    let mut odd_group = wpa2_bss();
    if let Some(rsn) = odd_group.security.rsn.as_mut() {
        rsn.group = Cipher::Gcmp;
    }
    assert_rejected(
        fixture.run(&odd_group, &wpa2_profile()),
        RejectReason::GroupCipherMismatch,
        MatchCheck::Security,
    );

    let mut eap_only = wpa2_bss();
    if let Some(rsn) = eap_only.security.rsn.as_mut() {
        rsn.key_mgmt = EnumSet::only(KeyMgmt::Ieee8021x);
    }
    assert_rejected(
        fixture.run(&eap_only, &wpa2_profile()),
        RejectReason::KeyMgmtMismatch,
        MatchCheck::Security,
    );
}

#[test]
fn mfp_requirements_on_both_sides() {
    let fixture = Fixture::new();
    let mut required = wpa2_profile();
    required.security.mfp = MfpPolicy::Required;
    assert_rejected(
        fixture.run(&wpa2_bss(), &required),
        RejectReason::MfpUnsupported,
        MatchCheck::Security,
    );

    let mut ap_requires = wpa2_bss();
    if let Some(rsn) = ap_requires.security.rsn.as_mut() {
        rsn.mfp_capable = true;
        rsn.mfp_required = true;
    }
    assert_rejected(
        fixture.run(&ap_requires, &wpa2_profile()),
        RejectReason::MfpUnsupported,
        MatchCheck::Security,
    );
    assert!(fixture.run(&ap_requires, &required).accepted());

    let mut pinned_bip = required.clone();
    pinned_bip.security.group_mgmt = Some(Cipher::BipGmac256);
    assert_rejected(
        fixture.run(&ap_requires, &pinned_bip),
        RejectReason::GroupCipherMismatch,
        MatchCheck::Security,
    );
}

#[test]
fn wpa_element_used_when_rsn_not_allowed() {
    let fixture = Fixture::new();
    let mut legacy = wpa2_bss();
    legacy.security = BssSecurity {
        wpa: Some(SecurityIe::wpa_psk_tkip()),
        ..BssSecurity::open()
    };
    assert!(fixture.run(&legacy, &wpa2_profile()).accepted());

    let mut rsn_only = wpa2_profile();
    rsn_only.security.proto = EnumSet::only(Proto::Rsn);
    assert_rejected(
        fixture.run(&legacy, &rsn_only),
        RejectReason::KeyMgmtMismatch,
        MatchCheck::Security,
    );
}

#[test]
fn non_wpa_bss_needs_non_wpa_key_mgmt() {
    let fixture = Fixture::new();
    let mut privacy_no_ie = open_bss();
    privacy_no_ie.caps.insert(BssCapability::Privacy);
    let mut wpa2_for_cafe = wpa2_profile();
    wpa2_for_cafe.ssid = Ssid::from_text("cafe").unwrap();
    assert_rejected(
        fixture.run(&privacy_no_ie, &wpa2_for_cafe),
        RejectReason::NonWpaNotAllowed,
        MatchCheck::Security,
    );

    let mut wep = open_profile().with_security(SecurityPolicy::wep());
    wep.ssid = Ssid::from_text("cafe").unwrap();
    assert!(fixture.run(&privacy_no_ie, &wep).accepted());

    let mut dot1x = wpa2_for_cafe.clone();
    dot1x.security.key_mgmt = EnumSet::only(KeyMgmt::Ieee8021xNoWpa);
    assert!(fixture.run(&privacy_no_ie, &dot1x).accepted());
}

#[test]
fn wep_profile_rejects_wpa_bss() {
    let fixture = Fixture::new();
    let mut wep = wpa2_profile().with_security(SecurityPolicy::wep());
    wep.ssid = Ssid::from_text("home").unwrap();
    assert_rejected(
        fixture.run(&wpa2_bss(), &wep),
        RejectReason::WpaForWepProfile,
        MatchCheck::Security,
    );
}

#[test]
fn infrastructure_needs_ess_and_pbss_agreement() {
    let fixture = Fixture::new();
    let mut ibss = open_bss();
    ibss.caps = EnumSet::only(BssCapability::Ibss);
    assert_rejected(
        fixture.run(&ibss, &open_profile()),
        RejectReason::NotEssOrPbss,
        MatchCheck::Mode,
    );

    let mut pbss = open_bss();
    pbss.caps = EnumSet::only(BssCapability::Pbss);
    assert_rejected(
        fixture.run(&pbss, &open_profile()),
        RejectReason::PbssMismatch,
        MatchCheck::Mode,
    );
    let mut any = open_profile();
    any.pbss = PbssPolicy::Any;
    assert!(fixture.run(&pbss, &any).accepted());
}

#[test]
fn ibss_and_mesh_modes() {
    let fixture = Fixture::new();
    let mut ibss = open_bss();
    ibss.caps = EnumSet::only(BssCapability::Ibss);

    let mut adhoc = open_profile().with_mode(ProfileMode::Ibss);
    assert!(fixture.run(&ibss, &adhoc).accepted());
    assert_rejected(
        fixture.run(&open_bss(), &adhoc),
        RejectReason::ModeMismatch,
        MatchCheck::Mode,
    );

    adhoc.fixed_freq_mhz = Some(2_412);
    assert_rejected(
        fixture.run(&ibss, &adhoc),
        RejectReason::FrequencyMismatch,
        MatchCheck::Mode,
    );

    let mut secured_ibss = ibss.clone();
    secured_ibss.caps.insert(BssCapability::Privacy);
    secured_ibss.security.rsn = Some(SecurityIe::rsn_psk_ccmp());
    let mut psk_adhoc = wpa2_profile().with_mode(ProfileMode::Ibss);
    psk_adhoc.ssid = Ssid::from_text("cafe").unwrap();
    assert_rejected(
        fixture.run(&secured_ibss, &psk_adhoc),
        RejectReason::IbssSecurityUnsupported,
        MatchCheck::Mode,
    );

    let mut mesh = open_bss();
    mesh.caps = enum_set!(BssCapability::Mesh);
    assert!(fixture
        .run(&mesh, &open_profile().with_mode(ProfileMode::Mesh))
        .accepted());
}

#[test]
fn ap_profiles_never_match_scanned_bss() {
    let fixture = Fixture::new();
    for mode in [ProfileMode::Ap, ProfileMode::P2pGo] {
        assert_rejected(
            fixture.run(&open_bss(), &open_profile().with_mode(mode)),
            RejectReason::ModeMismatch,
            MatchCheck::Mode,
        );
    }
}

#[test]
fn frequency_allow_list_applies() {
    let fixture = Fixture::new();
    let mut profile = wpa2_profile();
    profile.freq_list.push(5_180).unwrap();
    assert_rejected(
        fixture.run(&wpa2_bss(), &profile),
        RejectReason::FrequencyNotAllowed,
        MatchCheck::FrequencyList,
    );
    profile.freq_list.push(2_437).unwrap();
    assert!(fixture.run(&wpa2_bss(), &profile).accepted());
}

#[test]
fn unsupported_rates_rejected() {
    let mut fixture = Fixture::new();
    fixture
        .hw_modes
        .insert(HwMode::new(Band::Band2_4GHz, &[2, 4, 11, 22]));
    let mut bss = wpa2_bss();
    bss.basic_rates.push(108).unwrap();
    assert_rejected(
        fixture.run(&bss, &wpa2_profile()),
        RejectReason::RateSetUnsupported,
        MatchCheck::RateSet,
    );

    let mut h2e = wpa2_bss();
    h2e.selectors.insert(PhySelector::SaeH2e);
    assert_rejected(
        fixture.run(&h2e, &wpa2_profile()),
        RejectReason::RateSetUnsupported,
        MatchCheck::RateSet,
    );
}

#[test]
fn stale_records_rejected() {
    let fixture = Fixture::new();
    let old = wpa2_bss().seen_at(NOW_MS - 30_001);
    assert_rejected(
        fixture.run(&old, &wpa2_profile()),
        RejectReason::Stale,
        MatchCheck::ScanRecency,
    );
    let edge = wpa2_bss().seen_at(NOW_MS - 30_000);
    assert!(fixture.run(&edge, &wpa2_profile()).accepted());
}

#[test]
fn earliest_failing_check_is_reported() {
    let mut fixture = Fixture::new();
    fixture.blacklist.add(bssid(1), 0);
    let mut profile = wpa2_profile();
    profile.enabled = false;
    profile.ssid = Ssid::from_text("elsewhere").unwrap();
    let stale = wpa2_bss().seen_at(0);
    assert_eq!(
        fixture.run(&stale, &profile),
        MatchResult::Reject(RejectReason::Blacklisted)
    );
}

#[test]
fn every_reason_maps_to_one_check() {
    assert_eq!(RejectReason::None.check(), None);
    assert_eq!(RejectReason::Stale.as_u8(), 25);
    assert_eq!(
        RejectReason::WpaForWepProfile.check().map(MatchCheck::as_str),
        Some("security")
    );
}
