use enumset::EnumSet;
use heapless::FnvIndexMap;
use statig::prelude::*;

use super::{
    actions::{ActionBuffer, AuthFailureKind, LinkAction, Notification},
    reason::{
        disconnect_reason_recoverable, reason_label, REASON_DEAUTH_LEAVING,
        REASON_DISASSOC_INACTIVITY, REASON_IE_IN_4WAY_DIFFERS, REASON_MICHAEL_MIC_FAILURE,
    },
    state::LinkState,
    timers::{TimerKind, TimerSet},
};
use crate::{
    blacklist::Blacklist,
    config::{temp_disable_secs, ConnPolicy, PROFILE_CAPACITY, WIFI_COUNTERMEASURES_MS},
    types::{
        BssRecord, Bssid, KeyMgmt, NetworkProfile, ProfileId, ProfileMode, RadioCommand,
        KEY_MGMT_PSK_FAMILY,
    },
};

/// What a connect attempt is aimed at. A zero BSSID starts a new network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectTarget {
    pub profile: ProfileId,
    pub bssid: Bssid,
    pub freq_mhz: u32,
    pub key_mgmt: EnumSet<KeyMgmt>,
    pub mode: ProfileMode,
}

impl ConnectTarget {
    pub fn join(profile: &NetworkProfile, bss: &BssRecord) -> Self {
        Self {
            profile: profile.id,
            bssid: bss.bssid,
            freq_mhz: bss.freq_mhz,
            key_mgmt: profile.security.key_mgmt,
            mode: profile.mode,
        }
    }

    pub fn create(profile: &NetworkProfile) -> Self {
        Self {
            profile: profile.id,
            bssid: Bssid::ZERO,
            freq_mhz: profile.fixed_freq_mhz.unwrap_or(0),
            key_mgmt: profile.security.key_mgmt,
            mode: profile.mode,
        }
    }

    pub fn creates_network(&self) -> bool {
        self.bssid.is_zero()
    }

    fn uses_psk(&self) -> bool {
        !self.key_mgmt.is_disjoint(KEY_MGMT_PSK_FAMILY)
    }
}

/// Inputs of the link state machine: decoded driver events, timer expiries and
/// decisions taken by the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkInput {
    Connect(ConnectTarget),
    AuthSuccess {
        bssid: Bssid,
    },
    AssocSuccess {
        bssid: Bssid,
        /// BSSID the radio reports after association; zero when it has none.
        reported: Bssid,
    },
    AssocReject {
        bssid: Bssid,
        status_code: u16,
        timed_out: bool,
    },
    Disconnect {
        bssid: Bssid,
        reason: u16,
        locally_generated: bool,
        /// Profile still enabled, not temporarily disabled and not disallowed.
        profile_usable: bool,
    },
    MicFailure {
        unicast: bool,
    },
    HandshakeStarted,
    PortAuthorized,
    InterfaceEnabled,
    InterfaceDisabled,
    TimerFired(TimerKind),
    ScheduleScan {
        delay_ms: u32,
    },
    RequestDisconnect,
    RequestReconnect,
    ClearBlacklist,
    RoamIndication(Option<Bssid>),
    LeaveDisallowed,
}

impl LinkInput {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Connect(_) => "connect",
            Self::AuthSuccess { .. } => "auth",
            Self::AssocSuccess { .. } => "assoc",
            Self::AssocReject { .. } => "assoc_reject",
            Self::Disconnect { .. } => "disconnect",
            Self::MicFailure { .. } => "michael_mic_failure",
            Self::HandshakeStarted => "handshake_started",
            Self::PortAuthorized => "port_authorized",
            Self::InterfaceEnabled => "interface_enabled",
            Self::InterfaceDisabled => "interface_disabled",
            Self::TimerFired(kind) => kind.as_str(),
            Self::ScheduleScan { .. } => "schedule_scan",
            Self::RequestDisconnect => "request_disconnect",
            Self::RequestReconnect => "request_reconnect",
            Self::ClearBlacklist => "clear_blacklist",
            Self::RoamIndication(_) => "roam_indication",
            Self::LeaveDisallowed => "leave_disallowed",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(super) struct DispatchContext {
    pub(super) actions: ActionBuffer,
    pub(super) now_ms: u64,
    pub(super) policy: ConnPolicy,
}

impl DispatchContext {
    pub(super) fn new(now_ms: u64, policy: ConnPolicy) -> Self {
        Self {
            actions: ActionBuffer::new(),
            now_ms,
            policy,
        }
    }

    fn radio(&mut self, command: RadioCommand) {
        self.actions.push(LinkAction::Radio(command));
    }

    fn notify(&mut self, notification: Notification) {
        self.actions.push(LinkAction::Notify(notification));
    }
}

pub(super) struct LinkHsm {
    pub(super) state_id: LinkState,
    pub(super) target: Option<ConnectTarget>,
    /// Associated BSSID; zero unless at least associated.
    pub(super) bssid: Bssid,
    pub(super) pending_bssid: Bssid,
    pub(super) blacklist: Blacklist,
    pub(super) timers: TimerSet,
    pub(super) auth_failures: FnvIndexMap<ProfileId, u16, PROFILE_CAPACITY>,
    pub(super) countermeasures: bool,
    pub(super) admin_disconnected: bool,
    pub(super) roam_indication: Option<Bssid>,
    /// Negative when the disconnect was generated locally.
    pub(super) last_disconnect_reason: i32,
}

impl LinkHsm {
    pub(super) fn new() -> Self {
        Self {
            state_id: LinkState::Disconnected,
            target: None,
            bssid: Bssid::ZERO,
            pending_bssid: Bssid::ZERO,
            blacklist: Blacklist::new(),
            timers: TimerSet::new(),
            auth_failures: FnvIndexMap::new(),
            countermeasures: false,
            admin_disconnected: false,
            roam_indication: None,
            last_disconnect_reason: 0,
        }
    }

    /// Associated BSSID, else the one being connected to.
    pub(super) fn link_bssid(&self) -> Bssid {
        if self.bssid.is_zero() {
            self.pending_bssid
        } else {
            self.bssid
        }
    }

    fn state_for(state: LinkState) -> State {
        match state {
            LinkState::Disconnected => State::disconnected(),
            LinkState::Authenticating => State::authenticating(),
            LinkState::Associating => State::associating(),
            LinkState::Associated => State::associated(),
            LinkState::FourWayHandshake => State::four_way_handshake(),
            LinkState::Completed => State::completed(),
            LinkState::InterfaceDisabled => State::interface_disabled(),
        }
    }

    fn enter(&mut self, context: &mut DispatchContext, to: LinkState) -> Outcome<State> {
        if self.state_id != to {
            context.notify(Notification::StateChanged {
                from: self.state_id,
                to,
            });
            self.state_id = to;
        }
        Transition(Self::state_for(to))
    }

    fn clear_link(&mut self) {
        self.target = None;
        self.bssid = Bssid::ZERO;
        self.pending_bssid = Bssid::ZERO;
        self.timers.cancel(TimerKind::AuthTimeout);
    }

    fn schedule_scan(&mut self, context: &DispatchContext, delay_ms: u32) {
        self.timers.arm_earliest(
            TimerKind::Scan,
            context.now_ms.saturating_add(u64::from(delay_ms)),
        );
    }

    fn start_connect(&mut self, context: &mut DispatchContext, target: ConnectTarget) -> Outcome<State> {
        if self.countermeasures {
            log::warn!("connman: connect to {} refused during countermeasures", target.bssid);
            return Handled;
        }
        if self.admin_disconnected {
            log::debug!("connman: connect ignored, administratively disconnected");
            return Handled;
        }
        if self.state_id.in_progress()
            && !target.bssid.is_zero()
            && (target.bssid == self.pending_bssid || target.bssid == self.bssid)
        {
            return Handled;
        }
        if self.state_id.is_linked()
            && self
                .target
                .is_some_and(|current| current.profile != target.profile)
        {
            context.radio(RadioCommand::Deauthenticate {
                reason: REASON_DEAUTH_LEAVING,
            });
        }

        self.timers.cancel(TimerKind::Scan);
        self.timers.arm(
            TimerKind::AuthTimeout,
            context
                .now_ms
                .saturating_add(u64::from(context.policy.connect_timeout_ms)),
        );
        if target.creates_network() {
            log::info!("connman: starting network for profile {}", target.profile);
            context.radio(RadioCommand::StartNetwork {
                profile: target.profile,
            });
        } else {
            log::info!(
                "connman: connecting to {} profile={} freq={}",
                target.bssid,
                target.profile,
                target.freq_mhz
            );
            context.radio(RadioCommand::Connect {
                bssid: target.bssid,
                profile: target.profile,
            });
        }
        self.target = Some(target);
        self.pending_bssid = target.bssid;
        self.bssid = Bssid::ZERO;
        self.enter(context, LinkState::Authenticating)
    }

    fn associate(
        &mut self,
        context: &mut DispatchContext,
        bssid: Bssid,
        reported: Bssid,
    ) -> Outcome<State> {
        if reported.is_zero() {
            log::warn!("connman: association without a BSSID, deauthenticating");
            context.radio(RadioCommand::Deauthenticate {
                reason: REASON_DEAUTH_LEAVING,
            });
            self.clear_link();
            self.schedule_scan(context, context.policy.disconnect_rescan_ms);
            return self.enter(context, LinkState::Disconnected);
        }
        if !bssid.is_zero() && bssid != reported {
            log::debug!("connman: assoc event for {} but radio reports {}", bssid, reported);
        }
        self.bssid = reported;
        self.pending_bssid = Bssid::ZERO;
        self.enter(context, LinkState::Associated)
    }

    fn complete(&mut self, context: &mut DispatchContext) -> Outcome<State> {
        self.timers.cancel(TimerKind::AuthTimeout);
        let bssid = self.bssid;
        let freq_mhz = self.target.map_or(0, |target| target.freq_mhz);
        if let Some(target) = self.target {
            self.auth_failures.remove(&target.profile);
            context
                .actions
                .push(LinkAction::ClearTempDisable { profile: target.profile });
        }
        self.blacklist.remove(&bssid);
        let outcome = self.enter(context, LinkState::Completed);
        context.notify(Notification::Connected { bssid, freq_mhz });
        outcome
    }

    fn auth_failed(&mut self, context: &mut DispatchContext, kind: AuthFailureKind) {
        let Some(target) = self.target else {
            return;
        };
        let failures = self
            .auth_failures
            .get(&target.profile)
            .copied()
            .unwrap_or(0)
            .saturating_add(1);
        if self.auth_failures.insert(target.profile, failures).is_err() {
            log::warn!("connman: auth failure table full");
        }
        let until_ms = context
            .now_ms
            .saturating_add(u64::from(temp_disable_secs(failures)) * 1_000);
        log::warn!(
            "connman: auth failed profile={} kind={} failures={} disabled_until={}",
            target.profile,
            kind.as_str(),
            failures,
            until_ms
        );
        context.notify(Notification::AuthFailed {
            profile: target.profile,
            kind,
        });
        context.actions.push(LinkAction::TempDisable {
            profile: target.profile,
            until_ms,
        });
        context.notify(Notification::TempDisabled {
            profile: target.profile,
            until_ms,
            reason: kind,
        });
    }

    /// Blacklists `bssid` and backs off the next scan. Returns true when the
    /// failure streak disabled the current profile.
    fn connection_failed(&mut self, context: &mut DispatchContext, bssid: Bssid) -> bool {
        if bssid.is_zero() {
            return false;
        }
        let count = self.blacklist.add(bssid, context.now_ms);
        let delay_ms = ConnPolicy::failure_rescan_ms(count);
        log::info!(
            "connman: connection failed bssid={} count={} rescan_ms={}",
            bssid,
            count,
            delay_ms
        );
        self.schedule_scan(context, delay_ms);
        if count > u16::from(context.policy.conn_failure_disable_after) && self.target.is_some() {
            self.auth_failed(context, AuthFailureKind::ConnFailed);
            return true;
        }
        false
    }

    fn assoc_rejected(
        &mut self,
        context: &mut DispatchContext,
        bssid: Bssid,
        status_code: u16,
        timed_out: bool,
    ) -> Outcome<State> {
        let bssid = if bssid.is_zero() {
            self.pending_bssid
        } else {
            bssid
        };
        log::info!(
            "connman: association rejected bssid={} status={} timed_out={}",
            bssid,
            status_code,
            timed_out
        );
        context.notify(Notification::AssocStatus {
            bssid,
            status_code,
            timed_out,
        });
        self.connection_failed(context, bssid);
        self.clear_link();
        self.enter(context, LinkState::Disconnected)
    }

    fn link_lost(
        &mut self,
        context: &mut DispatchContext,
        bssid: Bssid,
        reason: u16,
        locally_generated: bool,
        profile_usable: bool,
    ) -> Outcome<State> {
        let from = self.state_id;
        let target = self.target;
        let lost = self.link_bssid();
        let reported = if bssid.is_zero() { lost } else { bssid };

        if from == LinkState::FourWayHandshake
            && target.is_some_and(|target| target.uses_psk())
            && !(locally_generated && reason == REASON_IE_IN_4WAY_DIFFERS)
        {
            log::warn!("connman: 4-way handshake failed, passphrase may be wrong");
            self.auth_failed(context, AuthFailureKind::WrongKey);
        }

        let mut reconnect = from == LinkState::Completed
            && target.is_some_and(|target| target.mode == ProfileMode::Infrastructure)
            && !locally_generated
            && disconnect_reason_recoverable(reason)
            && profile_usable
            && !self.admin_disconnected
            && !self.countermeasures;
        if self.connection_failed(context, lost) {
            reconnect = false;
        }
        if !reconnect && from >= LinkState::Associating {
            self.schedule_scan(context, context.policy.disconnect_rescan_ms);
        }

        self.last_disconnect_reason = if locally_generated {
            -i32::from(reason)
        } else {
            i32::from(reason)
        };
        if locally_generated && reason == REASON_DISASSOC_INACTIVITY && !lost.is_zero() {
            context.actions.push(LinkAction::ForgetBss { bssid: lost });
        }
        log::info!(
            "connman: disconnected bssid={} reason={} ({}) local={}",
            reported,
            reason,
            reason_label(reason),
            locally_generated
        );
        context.notify(Notification::Disconnected {
            bssid: reported,
            reason,
            locally_generated,
        });
        self.clear_link();

        match target {
            Some(target) if reconnect => {
                log::info!("connman: fast reconnect to {}", lost);
                self.start_connect(
                    context,
                    ConnectTarget {
                        bssid: lost,
                        ..target
                    },
                )
            }
            _ => self.enter(context, LinkState::Disconnected),
        }
    }

    /// Locally initiated teardown: deauthenticate and report it.
    fn leave(&mut self, context: &mut DispatchContext, reason: u16) {
        let bssid = self.link_bssid();
        context.radio(RadioCommand::Deauthenticate { reason });
        context.notify(Notification::Disconnected {
            bssid,
            reason,
            locally_generated: true,
        });
        self.last_disconnect_reason = -i32::from(reason);
        self.clear_link();
    }

    fn auth_timed_out(&mut self, context: &mut DispatchContext) -> Outcome<State> {
        self.timers.cancel(TimerKind::AuthTimeout);
        let bssid = self.link_bssid();
        log::warn!(
            "connman: connect timeout bssid={} state={}",
            bssid,
            self.state_id.as_str()
        );
        self.connection_failed(context, bssid);
        self.leave(context, REASON_DEAUTH_LEAVING);
        self.enter(context, LinkState::Disconnected)
    }

    fn mic_failure(&mut self, context: &mut DispatchContext, unicast: bool) -> Outcome<State> {
        context.notify(Notification::MicFailure { unicast });
        if self.countermeasures {
            log::debug!("connman: MIC failure during countermeasures");
            return Handled;
        }

        self.countermeasures = true;
        let bssid = self.link_bssid();
        if !bssid.is_zero() {
            self.blacklist.add(bssid, context.now_ms);
        }
        log::warn!("connman: TKIP countermeasures started bssid={}", bssid);
        context.radio(RadioCommand::SetCountermeasures(true));
        context.notify(Notification::CountermeasuresStarted);
        self.timers.arm(
            TimerKind::Countermeasures,
            context
                .now_ms
                .saturating_add(u64::from(WIFI_COUNTERMEASURES_MS)),
        );

        if !self.state_id.in_progress() {
            return Handled;
        }
        self.leave(context, REASON_MICHAEL_MIC_FAILURE);
        self.enter(context, LinkState::Disconnected)
    }

    fn timer_fired(&mut self, context: &mut DispatchContext, kind: TimerKind) -> Outcome<State> {
        self.timers.cancel(kind);
        match kind {
            TimerKind::Scan => {
                if self.admin_disconnected {
                    log::debug!("connman: scan skipped, administratively disconnected");
                } else {
                    context.radio(RadioCommand::StartScan);
                }
            }
            TimerKind::Countermeasures => {
                if self.countermeasures {
                    self.countermeasures = false;
                    log::info!("connman: TKIP countermeasures stopped");
                    context.radio(RadioCommand::SetCountermeasures(false));
                    context.notify(Notification::CountermeasuresStopped);
                    self.schedule_scan(context, 0);
                }
            }
            TimerKind::AuthTimeout => {}
        }
        Handled
    }

    fn interface_down(&mut self, context: &mut DispatchContext) -> Outcome<State> {
        log::info!("connman: interface disabled");
        self.clear_link();
        self.timers.cancel_all();
        context.actions.push(LinkAction::FlushCatalog);
        if self.countermeasures {
            self.countermeasures = false;
            context.notify(Notification::CountermeasuresStopped);
        }
        self.enter(context, LinkState::InterfaceDisabled)
    }

    fn clear_blacklist(&mut self, context: &mut DispatchContext) {
        log::info!("connman: blacklist cleared ({} entries)", self.blacklist.len());
        self.blacklist.clear();
        context.notify(Notification::BlacklistCleared);
    }
}

#[state_machine(initial = "State::disconnected()")]
impl LinkHsm {
    #[state(superstate = "enabled")]
    fn disconnected(&mut self, context: &mut DispatchContext, event: &LinkInput) -> Outcome<State> {
        let _ = (context, event);
        Super
    }

    #[state(superstate = "connecting")]
    fn authenticating(
        &mut self,
        context: &mut DispatchContext,
        event: &LinkInput,
    ) -> Outcome<State> {
        match event {
            LinkInput::AuthSuccess { .. } => self.enter(context, LinkState::Associating),
            LinkInput::AssocSuccess { bssid, reported } => {
                // Drivers with in-firmware SME skip the separate auth event.
                let _ = self.enter(context, LinkState::Associating);
                self.associate(context, *bssid, *reported)
            }
            _ => Super,
        }
    }

    #[state(superstate = "connecting")]
    fn associating(&mut self, context: &mut DispatchContext, event: &LinkInput) -> Outcome<State> {
        match event {
            LinkInput::AssocSuccess { bssid, reported } => {
                self.associate(context, *bssid, *reported)
            }
            _ => Super,
        }
    }

    #[state(superstate = "linked")]
    fn associated(&mut self, context: &mut DispatchContext, event: &LinkInput) -> Outcome<State> {
        match event {
            LinkInput::HandshakeStarted => self.enter(context, LinkState::FourWayHandshake),
            _ => Super,
        }
    }

    #[state(superstate = "linked")]
    fn four_way_handshake(
        &mut self,
        context: &mut DispatchContext,
        event: &LinkInput,
    ) -> Outcome<State> {
        let _ = (context, event);
        Super
    }

    #[state(superstate = "linked")]
    fn completed(&mut self, context: &mut DispatchContext, event: &LinkInput) -> Outcome<State> {
        let _ = context;
        match event {
            // Rekeying re-authorizes the port on a live link.
            LinkInput::PortAuthorized | LinkInput::HandshakeStarted => Handled,
            _ => Super,
        }
    }

    #[state]
    fn interface_disabled(
        &mut self,
        context: &mut DispatchContext,
        event: &LinkInput,
    ) -> Outcome<State> {
        match event {
            LinkInput::InterfaceEnabled => {
                log::info!("connman: interface enabled");
                self.schedule_scan(context, 0);
                self.enter(context, LinkState::Disconnected)
            }
            LinkInput::TimerFired(kind) => {
                self.timers.cancel(*kind);
                Handled
            }
            LinkInput::RequestDisconnect => {
                self.admin_disconnected = true;
                Handled
            }
            LinkInput::RequestReconnect => {
                self.admin_disconnected = false;
                Handled
            }
            LinkInput::ClearBlacklist => {
                self.clear_blacklist(context);
                Handled
            }
            _ => Handled,
        }
    }

    #[superstate(superstate = "enabled")]
    fn connecting(&mut self, context: &mut DispatchContext, event: &LinkInput) -> Outcome<State> {
        match event {
            LinkInput::AssocReject {
                bssid,
                status_code,
                timed_out,
            } => self.assoc_rejected(context, *bssid, *status_code, *timed_out),
            LinkInput::Disconnect {
                bssid,
                reason,
                locally_generated,
                profile_usable,
            } => self.link_lost(context, *bssid, *reason, *locally_generated, *profile_usable),
            LinkInput::TimerFired(TimerKind::AuthTimeout) => self.auth_timed_out(context),
            _ => Super,
        }
    }

    #[superstate(superstate = "enabled")]
    fn linked(&mut self, context: &mut DispatchContext, event: &LinkInput) -> Outcome<State> {
        match event {
            LinkInput::PortAuthorized => self.complete(context),
            LinkInput::Disconnect {
                bssid,
                reason,
                locally_generated,
                profile_usable,
            } => self.link_lost(context, *bssid, *reason, *locally_generated, *profile_usable),
            LinkInput::TimerFired(TimerKind::AuthTimeout) => self.auth_timed_out(context),
            _ => Super,
        }
    }

    #[superstate]
    fn enabled(&mut self, context: &mut DispatchContext, event: &LinkInput) -> Outcome<State> {
        match event {
            LinkInput::InterfaceDisabled => self.interface_down(context),
            LinkInput::Connect(target) => self.start_connect(context, *target),
            LinkInput::MicFailure { unicast } => self.mic_failure(context, *unicast),
            LinkInput::TimerFired(kind) => self.timer_fired(context, *kind),
            LinkInput::ScheduleScan { delay_ms } => {
                self.schedule_scan(context, *delay_ms);
                Handled
            }
            LinkInput::RequestDisconnect => {
                self.admin_disconnected = true;
                self.timers.cancel(TimerKind::Scan);
                if !self.state_id.in_progress() {
                    return Handled;
                }
                log::info!("connman: operator disconnect");
                self.leave(context, REASON_DEAUTH_LEAVING);
                self.enter(context, LinkState::Disconnected)
            }
            LinkInput::RequestReconnect => {
                self.admin_disconnected = false;
                self.schedule_scan(context, 0);
                Handled
            }
            LinkInput::LeaveDisallowed => {
                if !self.state_id.in_progress() {
                    return Handled;
                }
                log::info!("connman: leaving disallowed BSS {}", self.link_bssid());
                self.leave(context, REASON_DEAUTH_LEAVING);
                self.schedule_scan(context, context.policy.disconnect_rescan_ms);
                self.enter(context, LinkState::Disconnected)
            }
            LinkInput::ClearBlacklist => {
                self.clear_blacklist(context);
                Handled
            }
            LinkInput::RoamIndication(bssid) => {
                self.roam_indication = *bssid;
                if let Some(bssid) = bssid {
                    context.notify(Notification::RoamIndication { bssid: *bssid });
                }
                Handled
            }
            _ => Handled,
        }
    }
}
