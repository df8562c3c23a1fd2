use heapless::Vec;

use crate::{
    blacklist::Blacklist,
    catalog::BssCatalog,
    config::{ConnPolicy, PROFILE_CAPACITY},
    disallow::DisallowList,
    matcher::{matches, HwModeTable, MatchContext, MatchResult, RejectReason},
    profiles::ProfileStore,
    types::{BssRecord, Bssid, ProfileId, ProfileMode, Ssid},
};

#[cfg(test)]
mod tests;

/// The association the selector compares candidates against. Present only while completed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentLink {
    pub profile: ProfileId,
    pub bssid: Bssid,
    pub ssid: Ssid,
}

/// Final say on leaving a working association for a better-scoring candidate.
pub trait RoamGate {
    fn allow_roam(&mut self, current: &CurrentLink, candidate: &BssRecord) -> bool;
}

impl<F> RoamGate for F
where
    F: FnMut(&CurrentLink, &BssRecord) -> bool,
{
    fn allow_roam(&mut self, current: &CurrentLink, candidate: &BssRecord) -> bool {
        self(current, candidate)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum StayReason {
    BelowRoamThreshold = 1,
    CurrentApIsBest = 2,
    RoamNotWarranted = 3,
}

impl StayReason {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BelowRoamThreshold => "below_roam_threshold",
            Self::CurrentApIsBest => "current_ap_is_best",
            Self::RoamNotWarranted => "roam_not_warranted",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SelectionOutcome {
    Join {
        profile: ProfileId,
        bssid: Bssid,
    },
    Roam {
        profile: ProfileId,
        bssid: Bssid,
        from: Bssid,
    },
    Stay(StayReason),
    CreateNetwork {
        profile: ProfileId,
    },
    NotFound,
}

impl SelectionOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Roam { .. } => "roam",
            Self::Stay(reason) => reason.as_str(),
            Self::CreateNetwork { .. } => "create_network",
            Self::NotFound => "not_found",
        }
    }

    /// Profile and BSS to connect to, if the outcome asks for one.
    pub const fn target(self) -> Option<(ProfileId, Bssid)> {
        match self {
            Self::Join { profile, bssid } | Self::Roam { profile, bssid, .. } => {
                Some((profile, bssid))
            }
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SelectionTrace {
    pub passes: u8,
    /// A retry ran without the blacklist; the caller should clear its own copy.
    pub blacklist_cleared: bool,
    pub evaluated: u16,
    pub rejected: u16,
    pub last_reject: RejectReason,
    pub hysteresis_skips: u16,
    pub roam_denials: u16,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Selection {
    pub outcome: SelectionOutcome,
    pub trace: SelectionTrace,
}

#[derive(Clone, Copy, Debug)]
pub struct SelectionContext<'a> {
    pub now_ms: u64,
    pub policy: &'a ConnPolicy,
    pub disallowed: &'a DisallowList,
    pub hw_modes: &'a HwModeTable,
    pub countermeasures: bool,
    pub current: Option<&'a CurrentLink>,
}

enum PassResult {
    Found(SelectionOutcome),
    OnlySkipped,
    Empty,
}

/// Picks at most one BSS to join or roam to.
pub fn select<P, G>(
    catalog: &BssCatalog,
    profiles: &P,
    blacklist: &Blacklist,
    ctx: &SelectionContext<'_>,
    gate: &mut G,
) -> Selection
where
    P: ProfileStore,
    G: RoamGate,
{
    let mut trace = SelectionTrace::default();
    let current_record = ctx
        .current
        .and_then(|current| catalog.get_by_bssid(&current.bssid));

    if let Some(record) = current_record {
        let threshold = i32::from(ctx.policy.roam_threshold);
        if threshold > 0 && record.signal_magnitude() < threshold {
            return Selection {
                outcome: SelectionOutcome::Stay(StayReason::BelowRoamThreshold),
                trace,
            };
        }
    }

    let groups = priority_groups(profiles);
    let blacklist_limit = Blacklist::limit_for(profiles.enabled_count());

    // A retry without the blacklist only reports the clear; the caller owns the list.
    let cleared = Blacklist::new();
    let passes: [&Blacklist; 2] = [blacklist, &cleared];
    for (idx, pass_blacklist) in passes.into_iter().enumerate() {
        if idx == 1 {
            if blacklist.is_empty() || ctx.countermeasures {
                break;
            }
            log::info!("connman: no candidate, retrying without blacklist");
            trace.blacklist_cleared = true;
        }
        trace.passes += 1;
        let pass = run_pass(
            catalog,
            profiles,
            &groups,
            pass_blacklist,
            blacklist_limit,
            ctx,
            current_record,
            gate,
            &mut trace,
        );
        match pass {
            PassResult::Found(outcome) => return Selection { outcome, trace },
            PassResult::OnlySkipped => {
                return Selection {
                    outcome: SelectionOutcome::Stay(StayReason::RoamNotWarranted),
                    trace,
                }
            }
            PassResult::Empty => {}
        }
    }

    let outcome = if ctx.current.is_none() {
        create_network_candidate(profiles, ctx.now_ms)
            .map_or(SelectionOutcome::NotFound, |profile| {
                SelectionOutcome::CreateNetwork { profile }
            })
    } else {
        SelectionOutcome::NotFound
    };
    Selection { outcome, trace }
}

#[allow(clippy::too_many_arguments)]
fn run_pass<P, G>(
    catalog: &BssCatalog,
    profiles: &P,
    groups: &[i32],
    blacklist: &Blacklist,
    blacklist_limit: u16,
    ctx: &SelectionContext<'_>,
    current_record: Option<&BssRecord>,
    gate: &mut G,
    trace: &mut SelectionTrace,
) -> PassResult
where
    P: ProfileStore,
    G: RoamGate,
{
    let match_ctx = MatchContext {
        now_ms: ctx.now_ms,
        blacklist,
        blacklist_limit,
        disallowed: ctx.disallowed,
        hw_modes: ctx.hw_modes,
        freshness_ms: ctx.policy.bss_freshness_ms,
    };
    let mut skipped = false;

    for priority in groups {
        for profile in profiles
            .enabled_profiles()
            .filter(|profile| profile.priority == *priority)
        {
            for bss in catalog.iter() {
                trace.evaluated = trace.evaluated.saturating_add(1);
                if let MatchResult::Reject(reason) = matches(bss, profile, &match_ctx) {
                    trace.rejected = trace.rejected.saturating_add(1);
                    trace.last_reject = reason;
                    continue;
                }

                let Some(current) = ctx.current else {
                    return PassResult::Found(SelectionOutcome::Join {
                        profile: profile.id,
                        bssid: bss.bssid,
                    });
                };
                if bss.bssid == current.bssid {
                    return PassResult::Found(SelectionOutcome::Stay(StayReason::CurrentApIsBest));
                }
                if let Some(current_record) = current_record {
                    // Levels are negative dBm, so the gain is the drop in magnitude.
                    let gain = current_record.signal_magnitude() - bss.signal_magnitude();
                    if gain < i32::from(ctx.policy.roam_hysteresis) {
                        log::debug!(
                            "connman: skip roam to {} gain={} hysteresis={}",
                            bss.bssid,
                            gain,
                            ctx.policy.roam_hysteresis
                        );
                        trace.hysteresis_skips = trace.hysteresis_skips.saturating_add(1);
                        skipped = true;
                        continue;
                    }
                }
                if !gate.allow_roam(current, bss) {
                    trace.roam_denials = trace.roam_denials.saturating_add(1);
                    skipped = true;
                    continue;
                }
                return PassResult::Found(SelectionOutcome::Roam {
                    profile: profile.id,
                    bssid: bss.bssid,
                    from: current.bssid,
                });
            }
        }
    }

    if skipped {
        PassResult::OnlySkipped
    } else {
        PassResult::Empty
    }
}

/// Distinct priorities of the enabled profiles, highest first.
fn priority_groups<P>(profiles: &P) -> Vec<i32, PROFILE_CAPACITY>
where
    P: ProfileStore,
{
    let mut groups: Vec<i32, PROFILE_CAPACITY> = Vec::new();
    for profile in profiles.enabled_profiles() {
        if !groups.contains(&profile.priority) {
            let _ = groups.push(profile.priority);
        }
    }
    groups.sort_unstable_by(|a, b| b.cmp(a));
    groups
}

fn create_network_candidate<P>(profiles: &P, now_ms: u64) -> Option<ProfileId>
where
    P: ProfileStore,
{
    let has_infra = profiles
        .enabled_profiles()
        .any(|profile| profile.mode == ProfileMode::Infrastructure);
    if has_infra {
        return None;
    }
    profiles
        .enabled_profiles()
        .find(|profile| profile.mode.can_create_network() && !profile.temp_disabled(now_ms))
        .map(|profile| profile.id)
}
