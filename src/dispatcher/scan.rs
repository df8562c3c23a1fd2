use super::{DispatchReport, EventDispatcher};
use crate::{
    link::{ConnectTarget, LinkInput, LinkState, Notification},
    profiles::ProfileStore,
    radio::RadioInterface,
    selector::{
        self, CurrentLink, RoamGate, Selection, SelectionContext, SelectionOutcome, StayReason,
    },
    telemetry,
    types::{BssRecord, Bssid, ProfileId, ScanBatch},
};

/// Lets the radio veto roams: only a previous-BSSID mismatch reported by the
/// driver on a same-SSID candidate moves us.
struct RadioRoamGate<'a, R: RadioInterface> {
    radio: &'a R,
    allowed: Option<Bssid>,
}

impl<R: RadioInterface> RoamGate for RadioRoamGate<'_, R> {
    fn allow_roam(&mut self, current: &CurrentLink, candidate: &BssRecord) -> bool {
        // An empty profile SSID matches any candidate SSID.
        let same_ssid = current.ssid.is_empty() || candidate.ssid == current.ssid;
        if !self.radio.prev_bssid_mismatch(&candidate.bssid) || !same_ssid {
            log::debug!("connman: roam to {} not indicated by driver", candidate.bssid);
            return false;
        }
        self.allowed = Some(candidate.bssid);
        true
    }
}

impl<R: RadioInterface, P: ProfileStore> EventDispatcher<R, P> {
    pub(super) fn on_scan_results(
        &mut self,
        records: &ScanBatch,
        now_ms: u64,
        report: &mut DispatchReport,
    ) {
        let stored = self.catalog.apply_scan(records.iter(), now_ms);
        telemetry::record_scan(records.len(), self.catalog.len());
        log::debug!(
            "connman: scan results={} catalog={}",
            stored,
            self.catalog.len()
        );

        let expired = self.profiles.sweep_expired_disables(now_ms);
        if expired > 0 {
            log::info!("connman: {} profile disable window(s) expired", expired);
        }

        if self.profiles.enabled_count() == 0 {
            log::info!("connman: no enabled profiles, inactive");
            self.notify(Notification::Inactive, report);
            return;
        }

        let state = self.engine.state();
        let skip = match state {
            LinkState::InterfaceDisabled => Some("interface disabled"),
            _ if self.engine.admin_disconnected() => Some("disconnected by operator"),
            _ if self.engine.countermeasures() => Some("countermeasures active"),
            _ if state.in_progress() && state != LinkState::Completed => Some("connecting"),
            _ => None,
        };
        if let Some(why) = skip {
            log::debug!("connman: selection skipped, {}", why);
            return;
        }

        let (selection, roam_indication) = self.run_selection(now_ms);
        telemetry::record_selection(&selection);
        report.selection = Some(selection);
        log::info!(
            "connman: selection {} passes={} evaluated={} rejected={}",
            selection.outcome.as_str(),
            selection.trace.passes,
            selection.trace.evaluated,
            selection.trace.rejected
        );

        if selection.trace.blacklist_cleared {
            self.drive(LinkInput::ClearBlacklist, now_ms, "scan_results", report);
        }
        if let Some(indication) = roam_indication {
            self.drive(
                LinkInput::RoamIndication(indication),
                now_ms,
                "scan_results",
                report,
            );
        }
        self.apply_selection(selection.outcome, now_ms, report);
    }

    /// Runs the selector. The second value, when set, replaces the recorded
    /// roam indication.
    fn run_selection(&self, now_ms: u64) -> (Selection, Option<Option<Bssid>>) {
        let current = self.engine.completed_link().and_then(|(target, bssid)| {
            self.profiles
                .profile(target.profile)
                .map(|profile| CurrentLink {
                    profile: target.profile,
                    bssid,
                    ssid: profile.ssid.clone(),
                })
        });
        let policy = self.engine.policy();
        let ctx = SelectionContext {
            now_ms,
            policy: &policy,
            disallowed: &self.disallowed,
            hw_modes: self.radio.hw_modes(),
            countermeasures: self.engine.countermeasures(),
            current: current.as_ref(),
        };
        let mut gate = RadioRoamGate {
            radio: &self.radio,
            allowed: None,
        };
        let selection = selector::select(
            &self.catalog,
            &self.profiles,
            self.engine.blacklist(),
            &ctx,
            &mut gate,
        );
        let allowed = gate.allowed;

        let roam_indication = match selection.outcome {
            SelectionOutcome::Roam { bssid, .. } if allowed == Some(bssid) => Some(Some(bssid)),
            _ if current.is_none() && self.engine.roam_indication().is_some() => Some(None),
            _ => None,
        };
        (selection, roam_indication)
    }

    fn apply_selection(
        &mut self,
        outcome: SelectionOutcome,
        now_ms: u64,
        report: &mut DispatchReport,
    ) {
        match outcome {
            SelectionOutcome::Join { profile, bssid } => {
                if let Some(target) = self.join_target(profile, &bssid) {
                    self.drive(LinkInput::Connect(target), now_ms, "scan_results", report);
                }
            }
            SelectionOutcome::Roam {
                profile,
                bssid,
                from,
            } => {
                log::info!("connman: roaming {} -> {}", from, bssid);
                self.notify(Notification::BetterApFound { bssid }, report);
                if let Some(target) = self.join_target(profile, &bssid) {
                    self.drive(LinkInput::Connect(target), now_ms, "roam", report);
                }
            }
            SelectionOutcome::Stay(StayReason::CurrentApIsBest) => {
                self.notify(Notification::CurrentApIsBest, report);
            }
            SelectionOutcome::Stay(reason) => {
                log::debug!("connman: staying, {}", reason.as_str());
            }
            SelectionOutcome::CreateNetwork { profile } => {
                self.notify(Notification::ApNotFound, report);
                let target = self.profiles.profile(profile).map(ConnectTarget::create);
                if let Some(target) = target {
                    self.drive(LinkInput::Connect(target), now_ms, "create_network", report);
                }
            }
            SelectionOutcome::NotFound => {
                self.notify(Notification::ApNotFound, report);
                self.notify(Notification::NetworkNotFound, report);
                let delay_ms = self.engine.policy().scan_interval_ms;
                self.drive(
                    LinkInput::ScheduleScan { delay_ms },
                    now_ms,
                    "not_found",
                    report,
                );
            }
        }
    }

    fn join_target(&self, profile: ProfileId, bssid: &Bssid) -> Option<ConnectTarget> {
        let profile = self.profiles.profile(profile)?;
        let bss = self.catalog.get_by_bssid(bssid)?;
        Some(ConnectTarget::join(profile, bss))
    }
}
