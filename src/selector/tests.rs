use super::{
    select, CurrentLink, RoamGate, Selection, SelectionContext, SelectionOutcome, StayReason,
};
use crate::{
    blacklist::Blacklist,
    catalog::BssCatalog,
    config::ConnPolicy,
    disallow::DisallowList,
    matcher::{HwModeTable, RejectReason},
    profiles::{ProfileStore, ProfileTable},
    types::{
        BssCapability, BssRecord, BssSecurity, Bssid, NetworkProfile, ProfileId, ProfileMode,
        SecurityIe, SecurityPolicy, Ssid,
    },
};

const NOW_MS: u64 = 1_000;

fn bssid(last: u8) -> Bssid {
    Bssid::new([0x02, 0, 0, 0, 0, last])
}

fn secured(last: u8, ssid: &str, signal_dbm: i16) -> BssRecord {
    BssRecord::new(bssid(last), Ssid::from_text(ssid).unwrap(), 2_437, signal_dbm)
        .with_caps(BssCapability::Ess | BssCapability::Privacy)
        .with_security(BssSecurity {
            rsn: Some(SecurityIe::rsn_psk_ccmp()),
            ..BssSecurity::open()
        })
        .seen_at(NOW_MS)
}

fn profile(id: u16, ssid: &str, priority: i32) -> NetworkProfile {
    NetworkProfile::new(ProfileId(id), Ssid::from_text(ssid).unwrap()).with_priority(priority)
}

struct Harness {
    catalog: BssCatalog,
    profiles: ProfileTable,
    blacklist: Blacklist,
    policy: ConnPolicy,
    disallowed: DisallowList,
    hw_modes: HwModeTable,
    countermeasures: bool,
}

impl Harness {
    fn new() -> Self {
        Self {
            catalog: BssCatalog::new(),
            profiles: ProfileTable::new(),
            blacklist: Blacklist::new(),
            policy: ConnPolicy::defaults(),
            disallowed: DisallowList::new(),
            hw_modes: HwModeTable::new(),
            countermeasures: false,
        }
    }

    fn run<G: RoamGate>(&mut self, current: Option<&CurrentLink>, gate: &mut G) -> Selection {
        let ctx = SelectionContext {
            now_ms: NOW_MS,
            policy: &self.policy,
            disallowed: &self.disallowed,
            hw_modes: &self.hw_modes,
            countermeasures: self.countermeasures,
            current,
        };
        select(
            &self.catalog,
            &self.profiles,
            &self.blacklist,
            &ctx,
            gate,
        )
    }

    fn run_disconnected(&mut self) -> Selection {
        self.run(None, &mut |_: &CurrentLink, _: &BssRecord| true)
    }
}

fn link(last: u8, ssid: &str) -> CurrentLink {
    CurrentLink {
        profile: ProfileId(1),
        bssid: bssid(last),
        ssid: Ssid::from_text(ssid).unwrap(),
    }
}

#[test]
fn joins_first_match_in_catalog_order() {
    let mut h = Harness::new();
    h.profiles.insert(profile(1, "home", 0)).unwrap();
    h.catalog.upsert(secured(1, "home", -80));
    h.catalog.upsert(secured(2, "home", -40));

    let selection = h.run_disconnected();

    assert_eq!(
        selection.outcome,
        SelectionOutcome::Join {
            profile: ProfileId(1),
            bssid: bssid(1)
        }
    );
    assert_eq!(selection.trace.passes, 1);
}

#[test]
fn higher_priority_group_wins_regardless_of_signal() {
    let mut h = Harness::new();
    h.profiles.insert(profile(1, "low", 1)).unwrap();
    h.profiles.insert(profile(2, "high", 5)).unwrap();
    h.catalog.upsert(secured(1, "low", -30));
    h.catalog.upsert(secured(2, "high", -85));

    let selection = h.run_disconnected();

    assert_eq!(
        selection.outcome.target(),
        Some((ProfileId(2), bssid(2)))
    );
}

#[test]
fn same_group_tries_profiles_in_store_order() {
    let mut h = Harness::new();
    h.profiles.insert(profile(1, "first", 3)).unwrap();
    h.profiles.insert(profile(2, "second", 3)).unwrap();
    h.catalog.upsert(secured(1, "second", -40));
    h.catalog.upsert(secured(2, "first", -70));

    let selection = h.run_disconnected();

    assert_eq!(
        selection.outcome.target(),
        Some((ProfileId(1), bssid(2)))
    );
}

#[test]
fn nothing_matching_reports_not_found_with_reason() {
    let mut h = Harness::new();
    h.profiles.insert(profile(1, "home", 0)).unwrap();
    h.catalog.upsert(secured(1, "elsewhere", -40));

    let selection = h.run_disconnected();

    assert_eq!(selection.outcome, SelectionOutcome::NotFound);
    assert_eq!(selection.trace.evaluated, 1);
    assert_eq!(selection.trace.rejected, 1);
    assert_eq!(selection.trace.last_reject, RejectReason::SsidMismatch);
}

#[test]
fn blacklist_cleared_once_when_it_hides_every_candidate() {
    let mut h = Harness::new();
    h.profiles.insert(profile(1, "home", 0)).unwrap();
    h.profiles.insert(profile(2, "other", 0)).unwrap();
    h.catalog.upsert(secured(1, "home", -40));
    h.blacklist.add(bssid(1), 0);

    let selection = h.run_disconnected();

    assert_eq!(selection.outcome.target(), Some((ProfileId(1), bssid(1))));
    assert_eq!(selection.trace.passes, 2);
    assert!(selection.trace.blacklist_cleared);
    assert_eq!(h.blacklist.len(), 1);
}

#[test]
fn blacklist_kept_during_countermeasures() {
    let mut h = Harness::new();
    h.profiles.insert(profile(1, "home", 0)).unwrap();
    h.profiles.insert(profile(2, "other", 0)).unwrap();
    h.catalog.upsert(secured(1, "home", -40));
    h.blacklist.add(bssid(1), 0);
    h.countermeasures = true;

    let selection = h.run_disconnected();

    assert_eq!(selection.outcome, SelectionOutcome::NotFound);
    assert_eq!(selection.trace.passes, 1);
    assert_eq!(h.blacklist.len(), 1);
}

#[test]
fn strong_current_ap_short_circuits_search() {
    let mut h = Harness::new();
    h.profiles.insert(profile(1, "home", 0)).unwrap();
    h.catalog.upsert(secured(1, "home", -50));
    h.catalog.upsert(secured(2, "home", -30));
    let current = link(1, "home");

    let selection = h.run(Some(&current), &mut |_: &CurrentLink, _: &BssRecord| true);

    assert_eq!(
        selection.outcome,
        SelectionOutcome::Stay(StayReason::BelowRoamThreshold)
    );
    assert_eq!(selection.trace.evaluated, 0);
}

#[test]
fn current_ap_first_in_order_stays() {
    let mut h = Harness::new();
    h.policy.roam_threshold = 0;
    h.profiles.insert(profile(1, "home", 0)).unwrap();
    h.catalog.upsert(secured(1, "home", -80));
    h.catalog.upsert(secured(2, "home", -30));
    let current = link(1, "home");

    let selection = h.run(Some(&current), &mut |_: &CurrentLink, _: &BssRecord| true);

    assert_eq!(
        selection.outcome,
        SelectionOutcome::Stay(StayReason::CurrentApIsBest)
    );
}

#[test]
fn roam_requires_hysteresis_gain() {
    let mut h = Harness::new();
    h.policy.roam_threshold = 0;
    h.policy.roam_hysteresis = 10;
    h.profiles.insert(profile(1, "home", 0)).unwrap();
    h.catalog.upsert(secured(2, "home", -75));
    h.catalog.upsert(secured(1, "home", -80));
    let current = link(1, "home");

    let selection = h.run(Some(&current), &mut |_: &CurrentLink, _: &BssRecord| true);

    assert_eq!(
        selection.outcome,
        SelectionOutcome::Stay(StayReason::CurrentApIsBest)
    );
    assert_eq!(selection.trace.hysteresis_skips, 1);

    h.catalog.upsert(secured(2, "home", -70));
    let selection = h.run(Some(&current), &mut |_: &CurrentLink, _: &BssRecord| true);
    assert_eq!(
        selection.outcome,
        SelectionOutcome::Roam {
            profile: ProfileId(1),
            bssid: bssid(2),
            from: bssid(1)
        }
    );
}

#[test]
fn roam_gate_denial_keeps_link() {
    let mut h = Harness::new();
    h.policy.roam_threshold = 0;
    h.profiles.insert(profile(1, "home", 0)).unwrap();
    h.catalog.upsert(secured(2, "home", -40));
    let current = link(1, "home");

    let mut asked = 0;
    let selection = h.run(Some(&current), &mut |_: &CurrentLink, _: &BssRecord| {
        asked += 1;
        false
    });

    assert_eq!(
        selection.outcome,
        SelectionOutcome::Stay(StayReason::RoamNotWarranted)
    );
    assert_eq!(selection.trace.roam_denials, 1);
    assert_eq!(asked, 1);
}

#[test]
fn create_network_when_only_ad_hoc_profiles() {
    let mut h = Harness::new();
    h.profiles
        .insert(
            profile(7, "adhoc", 0)
                .with_mode(ProfileMode::Ibss)
                .with_security(SecurityPolicy::open()),
        )
        .unwrap();

    let selection = h.run_disconnected();

    assert_eq!(
        selection.outcome,
        SelectionOutcome::CreateNetwork {
            profile: ProfileId(7)
        }
    );
}

#[test]
fn infrastructure_profile_blocks_create_network() {
    let mut h = Harness::new();
    h.profiles.insert(profile(1, "home", 0)).unwrap();
    h.profiles
        .insert(profile(7, "hotspot", 0).with_mode(ProfileMode::Ap))
        .unwrap();

    let selection = h.run_disconnected();

    assert_eq!(selection.outcome, SelectionOutcome::NotFound);
    assert_eq!(h.profiles.enabled_count(), 2);
}
