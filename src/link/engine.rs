use statig::blocking::IntoStateMachineExt as _;

use super::{
    actions::ActionBuffer,
    machine::{ConnectTarget, DispatchContext, LinkHsm, LinkInput},
    state::{LinkSnapshot, LinkState},
    timers::TimerSet,
};
use crate::{blacklist::Blacklist, config::ConnPolicy, types::Bssid, types::ProfileId};

// Upper bound on timer expiries handled by one poll; each expiry disarms its slot.
const POLL_FIRE_LIMIT: usize = 8;

#[derive(Clone, Copy, Debug, Default)]
pub struct EngineOutput {
    pub before: LinkState,
    pub state: LinkState,
    pub actions: ActionBuffer,
}

impl EngineOutput {
    pub fn changed(&self) -> bool {
        self.before != self.state
    }
}

/// Owns the link state machine together with the blacklist, failure counters
/// and timers it drives.
pub struct LinkEngine {
    machine: statig::blocking::StateMachine<LinkHsm>,
    policy: ConnPolicy,
}

impl Default for LinkEngine {
    fn default() -> Self {
        Self::new(ConnPolicy::defaults())
    }
}

impl LinkEngine {
    pub fn new(policy: ConnPolicy) -> Self {
        Self {
            machine: LinkHsm::new().state_machine(),
            policy: policy.sanitized(),
        }
    }

    pub fn handle(&mut self, input: LinkInput, now_ms: u64) -> EngineOutput {
        let before = self.state();
        let mut context = DispatchContext::new(now_ms, self.policy);
        self.machine.handle_with_context(&input, &mut context);
        self.finish(before, context)
    }

    /// Fires every timer that is due at `now_ms`, including ones armed by an
    /// earlier expiry in the same call.
    pub fn poll(&mut self, now_ms: u64) -> EngineOutput {
        let before = self.state();
        let mut actions = ActionBuffer::new();
        for _ in 0..POLL_FIRE_LIMIT {
            let Some(kind) = self.machine.inner().timers.due(now_ms) else {
                break;
            };
            let output = self.handle(LinkInput::TimerFired(kind), now_ms);
            actions.extend(&output.actions);
        }
        EngineOutput {
            before,
            state: self.state(),
            actions,
        }
    }

    fn finish(&self, before: LinkState, context: DispatchContext) -> EngineOutput {
        EngineOutput {
            before,
            state: self.state(),
            actions: context.actions,
        }
    }

    pub fn state(&self) -> LinkState {
        self.machine.inner().state_id
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        let inner = self.machine.inner();
        LinkSnapshot {
            state: inner.state_id,
            bssid: inner.link_bssid(),
            countermeasures: inner.countermeasures,
            admin_disconnected: inner.admin_disconnected,
        }
    }

    pub fn policy(&self) -> ConnPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ConnPolicy) {
        self.policy = policy.sanitized();
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.machine.inner().timers.next_deadline()
    }

    pub fn timers(&self) -> &TimerSet {
        &self.machine.inner().timers
    }

    pub fn blacklist(&self) -> &Blacklist {
        &self.machine.inner().blacklist
    }

    /// Attempt in progress or established, if any.
    pub fn target(&self) -> Option<ConnectTarget> {
        self.machine.inner().target
    }

    /// Target and associated BSSID, only once the link is completed.
    pub fn completed_link(&self) -> Option<(ConnectTarget, Bssid)> {
        let inner = self.machine.inner();
        if inner.state_id != LinkState::Completed {
            return None;
        }
        inner.target.map(|target| (target, inner.bssid))
    }

    pub fn countermeasures(&self) -> bool {
        self.machine.inner().countermeasures
    }

    pub fn admin_disconnected(&self) -> bool {
        self.machine.inner().admin_disconnected
    }

    pub fn auth_failures(&self, profile: ProfileId) -> u16 {
        self.machine
            .inner()
            .auth_failures
            .get(&profile)
            .copied()
            .unwrap_or(0)
    }

    pub fn roam_indication(&self) -> Option<Bssid> {
        self.machine.inner().roam_indication
    }

    pub fn last_disconnect_reason(&self) -> i32 {
        self.machine.inner().last_disconnect_reason
    }
}
