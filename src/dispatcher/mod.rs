mod scan;


use crate::{
    catalog::BssCatalog,
    config::{
        channels::{EventMailbox, TimedEvent},
        ConnPolicy,
    },
    disallow::DisallowList,
    link::{
        ActionBuffer, EngineOutput, LinkAction, LinkEngine, LinkInput, LinkSnapshot, LinkState,
        Notification,
    },
    profiles::ProfileStore,
    radio::RadioInterface,
    selector::Selection,
    telemetry,
    types::{Bssid, DriverEvent, RadioCommand},
};

#[cfg(target_has_atomic = "64")]
use crate::link::SnapshotCell;

/// Everything one dispatch did, in the order it happened.
#[derive(Clone, Copy, Debug, Default)]
pub struct DispatchReport {
    pub before: LinkState,
    pub after: LinkState,
    pub actions: ActionBuffer,
    pub selection: Option<Selection>,
}

impl DispatchReport {
    fn starting(before: LinkState) -> Self {
        Self {
            before,
            after: before,
            actions: ActionBuffer::new(),
            selection: None,
        }
    }

    pub fn changed(&self) -> bool {
        self.before != self.after
    }

    pub fn radio_commands(&self) -> impl Iterator<Item = RadioCommand> + '_ {
        self.actions.radio_commands()
    }

    pub fn notifications(&self) -> impl Iterator<Item = Notification> + '_ {
        self.actions.notifications()
    }
}

pub(crate) fn emit_net_event(from: LinkState, to: LinkState, trigger: &str, at_ms: u64) {
    log::info!(
        "NET_EVENT {{\"from\":\"{}\",\"to\":\"{}\",\"trigger\":\"{}\",\"at_ms\":{}}}",
        from.as_str(),
        to.as_str(),
        trigger,
        at_ms
    );
}

/// Sole entry point of the connection core for one interface.
pub struct EventDispatcher<R: RadioInterface, P: ProfileStore> {
    catalog: BssCatalog,
    profiles: P,
    radio: R,
    engine: LinkEngine,
    disallowed: DisallowList,
}

impl<R: RadioInterface, P: ProfileStore> EventDispatcher<R, P> {
    pub fn new(radio: R, profiles: P, policy: ConnPolicy) -> Self {
        Self {
            catalog: BssCatalog::new(),
            profiles,
            radio,
            engine: LinkEngine::new(policy),
            disallowed: DisallowList::new(),
        }
    }

    pub fn dispatch(&mut self, event: DriverEvent, now_ms: u64) -> DispatchReport {
        let mut report = DispatchReport::starting(self.engine.state());
        let trigger = event.as_str();
        log::debug!(
            "connman: event {} in {}",
            trigger,
            self.engine.state().as_str()
        );

        let input = match event {
            DriverEvent::ScanResults(records) => {
                self.on_scan_results(&records, now_ms, &mut report);
                None
            }
            DriverEvent::AuthSuccess { bssid } => Some(LinkInput::AuthSuccess { bssid }),
            DriverEvent::AssocSuccess { bssid } => Some(LinkInput::AssocSuccess {
                bssid,
                reported: self.radio.get_bssid(),
            }),
            DriverEvent::AssocReject {
                bssid,
                status_code,
                timed_out,
            } => Some(LinkInput::AssocReject {
                bssid,
                status_code,
                timed_out,
            }),
            DriverEvent::Disassoc {
                bssid,
                reason,
                locally_generated,
            }
            | DriverEvent::Deauth {
                bssid,
                reason,
                locally_generated,
            } => Some(LinkInput::Disconnect {
                bssid,
                reason,
                locally_generated,
                profile_usable: self.target_profile_usable(&bssid, now_ms),
            }),
            DriverEvent::MichaelMicFailure { unicast } => Some(LinkInput::MicFailure { unicast }),
            DriverEvent::HandshakeStarted => Some(LinkInput::HandshakeStarted),
            DriverEvent::PortAuthorized => Some(LinkInput::PortAuthorized),
            DriverEvent::InterfaceEnabled => Some(LinkInput::InterfaceEnabled),
            DriverEvent::InterfaceDisabled => Some(LinkInput::InterfaceDisabled),
        };

        if let Some(input) = input {
            self.drive(input, now_ms, trigger, &mut report);
        }
        report.after = self.engine.state();
        report
    }

    /// Fires every expired timer.
    pub fn poll(&mut self, now_ms: u64) -> DispatchReport {
        let mut report = DispatchReport::starting(self.engine.state());
        let output = self.engine.poll(now_ms);
        self.apply(&output, now_ms, "timer", &mut report);
        report.after = self.engine.state();
        report
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.engine.next_deadline()
    }

    pub fn request_disconnect(&mut self, now_ms: u64) -> DispatchReport {
        self.operator(LinkInput::RequestDisconnect, now_ms)
    }

    pub fn request_reconnect(&mut self, now_ms: u64) -> DispatchReport {
        self.operator(LinkInput::RequestReconnect, now_ms)
    }

    pub fn clear_blacklist(&mut self, now_ms: u64) -> DispatchReport {
        self.operator(LinkInput::ClearBlacklist, now_ms)
    }

    /// Replaces the disallow list and leaves the current network if it is now blocked.
    pub fn set_disallowed(&mut self, disallowed: DisallowList, now_ms: u64) -> DispatchReport {
        self.disallowed = disallowed;
        let mut report = DispatchReport::starting(self.engine.state());
        if self.engine.state().in_progress() && self.current_link_blocked() {
            log::info!("connman: current network disallowed, leaving");
            self.drive(LinkInput::LeaveDisallowed, now_ms, "disallowed", &mut report);
        }
        report.after = self.engine.state();
        report
    }

    pub fn update_roam_params(&mut self, threshold: u8, hysteresis: u8) {
        let mut policy = self.engine.policy();
        policy.roam_threshold = threshold;
        policy.roam_hysteresis = hysteresis;
        self.engine.set_policy(policy);
        let applied = self.engine.policy();
        log::info!(
            "connman: roam params threshold={} hysteresis={}",
            applied.roam_threshold,
            applied.roam_hysteresis
        );
    }

    pub fn set_policy(&mut self, policy: ConnPolicy) {
        self.engine.set_policy(policy);
    }

    pub fn policy(&self) -> ConnPolicy {
        self.engine.policy()
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        self.engine.snapshot()
    }

    #[cfg(target_has_atomic = "64")]
    pub fn publish(&self, cell: &SnapshotCell) {
        cell.publish(self.engine.snapshot());
    }

    /// Processes every queued event. Returns how many were handled.
    pub fn drain(&mut self, mailbox: &EventMailbox) -> usize {
        let mut handled = 0;
        while let Some(TimedEvent { event, now_ms }) = mailbox.try_take() {
            self.dispatch(event, now_ms);
            handled += 1;
        }
        handled
    }

    pub async fn run_next(&mut self, mailbox: &EventMailbox) -> DispatchReport {
        let TimedEvent { event, now_ms } = mailbox.take().await;
        self.dispatch(event, now_ms)
    }

    pub fn catalog(&self) -> &BssCatalog {
        &self.catalog
    }

    pub fn profiles(&self) -> &P {
        &self.profiles
    }

    pub fn profiles_mut(&mut self) -> &mut P {
        &mut self.profiles
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn engine(&self) -> &LinkEngine {
        &self.engine
    }

    pub fn disallowed(&self) -> &DisallowList {
        &self.disallowed
    }

    fn operator(&mut self, input: LinkInput, now_ms: u64) -> DispatchReport {
        let mut report = DispatchReport::starting(self.engine.state());
        self.drive(input, now_ms, input.as_str(), &mut report);
        report.after = self.engine.state();
        report
    }

    fn drive(&mut self, input: LinkInput, now_ms: u64, trigger: &str, report: &mut DispatchReport) {
        let output = self.engine.handle(input, now_ms);
        self.apply(&output, now_ms, trigger, report);
    }

    fn apply(
        &mut self,
        output: &EngineOutput,
        now_ms: u64,
        trigger: &str,
        report: &mut DispatchReport,
    ) {
        for action in output.actions.iter() {
            match *action {
                LinkAction::Radio(command) => {
                    telemetry::record_radio_command(command);
                    self.radio.execute(command);
                }
                LinkAction::Notify(notification) => {
                    if let Notification::StateChanged { from, to } = notification {
                        emit_net_event(from, to, trigger, now_ms);
                    }
                    telemetry::record_notification(notification);
                }
                LinkAction::TempDisable { profile, until_ms } => {
                    if !self.profiles.mark_temporarily_disabled(profile, until_ms) {
                        log::warn!("connman: temp-disable for unknown profile {}", profile);
                    }
                }
                LinkAction::ClearTempDisable { profile } => {
                    self.profiles.clear_temporary_disable(profile);
                }
                LinkAction::ForgetBss { bssid } => {
                    self.catalog.remove(&bssid);
                }
                LinkAction::FlushCatalog => self.catalog.flush(),
            }
            report.actions.push(*action);
        }
    }

    fn notify(&mut self, notification: Notification, report: &mut DispatchReport) {
        telemetry::record_notification(notification);
        report.actions.push(LinkAction::Notify(notification));
    }

    fn target_profile_usable(&self, bssid: &Bssid, now_ms: u64) -> bool {
        let Some(target) = self.engine.target() else {
            return false;
        };
        self.profiles
            .profile(target.profile)
            .is_some_and(|profile| {
                profile.usable(now_ms) && !self.disallowed.blocks(bssid, &profile.ssid)
            })
    }

    fn current_link_blocked(&self) -> bool {
        let Some(target) = self.engine.target() else {
            return false;
        };
        let bssid = self.engine.snapshot().bssid;
        self.profiles
            .profile(target.profile)
            .is_some_and(|profile| self.disallowed.blocks(&bssid, &profile.ssid))
    }
}
