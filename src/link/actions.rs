use super::state::LinkState;
use crate::types::{Bssid, ProfileId, RadioCommand};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum AuthFailureKind {
    WrongKey = 1,
    ConnFailed = 2,
}

impl AuthFailureKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WrongKey => "WRONG_KEY",
            Self::ConnFailed => "CONN_FAILED",
        }
    }
}

/// Upward notifications for the embedding application.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Notification {
    StateChanged {
        from: LinkState,
        to: LinkState,
    },
    Connected {
        bssid: Bssid,
        freq_mhz: u32,
    },
    Disconnected {
        bssid: Bssid,
        reason: u16,
        locally_generated: bool,
    },
    RoamIndication {
        bssid: Bssid,
    },
    AssocStatus {
        bssid: Bssid,
        status_code: u16,
        timed_out: bool,
    },
    AuthFailed {
        profile: ProfileId,
        kind: AuthFailureKind,
    },
    TempDisabled {
        profile: ProfileId,
        until_ms: u64,
        reason: AuthFailureKind,
    },
    MicFailure {
        unicast: bool,
    },
    CountermeasuresStarted,
    CountermeasuresStopped,
    CurrentApIsBest,
    BetterApFound {
        bssid: Bssid,
    },
    ApNotFound,
    NetworkNotFound,
    BlacklistCleared,
    Inactive,
}

impl Notification {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "state_changed",
            Self::Connected { .. } => "connected",
            Self::Disconnected { .. } => "disconnected",
            Self::RoamIndication { .. } => "roam_indication",
            Self::AssocStatus { .. } => "assoc_status",
            Self::AuthFailed { .. } => "auth_failed",
            Self::TempDisabled { .. } => "temp_disabled",
            Self::MicFailure { .. } => "mic_failure",
            Self::CountermeasuresStarted => "countermeasures_started",
            Self::CountermeasuresStopped => "countermeasures_stopped",
            Self::CurrentApIsBest => "current_ap_is_best",
            Self::BetterApFound { .. } => "better_ap_found",
            Self::ApNotFound => "ap_not_found",
            Self::NetworkNotFound => "network_not_found",
            Self::BlacklistCleared => "blacklist_cleared",
            Self::Inactive => "inactive",
        }
    }
}

/// Everything one dispatch step produced, in emission order.
///
/// `Radio` commands are executed by the dispatcher, which also applies the
/// profile-store and catalog variants.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkAction {
    Radio(RadioCommand),
    Notify(Notification),
    TempDisable { profile: ProfileId, until_ms: u64 },
    ClearTempDisable { profile: ProfileId },
    ForgetBss { bssid: Bssid },
    FlushCatalog,
}

#[derive(Clone, Copy, Debug)]
pub struct ActionBuffer {
    len: usize,
    slots: [Option<LinkAction>; Self::MAX],
}

impl ActionBuffer {
    pub const MAX: usize = 24;

    pub const fn new() -> Self {
        Self {
            len: 0,
            slots: [None; Self::MAX],
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.slots = [None; Self::MAX];
    }

    pub fn push(&mut self, action: LinkAction) {
        if self.len >= Self::MAX {
            log::warn!("connman: action buffer full, dropping {:?}", action);
            return;
        }
        self.slots[self.len] = Some(action);
        self.len += 1;
    }

    pub fn extend(&mut self, other: &ActionBuffer) {
        for action in other.iter() {
            self.push(*action);
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkAction> {
        self.slots[..self.len].iter().filter_map(Option::as_ref)
    }

    pub fn radio_commands(&self) -> impl Iterator<Item = RadioCommand> + '_ {
        self.iter().filter_map(|action| match action {
            LinkAction::Radio(command) => Some(*command),
            _ => None,
        })
    }

    pub fn notifications(&self) -> impl Iterator<Item = Notification> + '_ {
        self.iter().filter_map(|action| match action {
            LinkAction::Notify(notification) => Some(*notification),
            _ => None,
        })
    }

    pub fn contains_radio(&self, command: RadioCommand) -> bool {
        self.radio_commands().any(|issued| issued == command)
    }

    pub fn contains_notification(&self, notification: Notification) -> bool {
        self.notifications().any(|emitted| emitted == notification)
    }
}

impl Default for ActionBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_drops_past_capacity() {
        let mut buffer = ActionBuffer::new();
        for _ in 0..ActionBuffer::MAX + 3 {
            buffer.push(LinkAction::Notify(Notification::ApNotFound));
        }
        assert_eq!(buffer.len(), ActionBuffer::MAX);
        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn filters_split_radio_and_notifications() {
        let mut buffer = ActionBuffer::new();
        buffer.push(LinkAction::Radio(RadioCommand::StartScan));
        buffer.push(LinkAction::Notify(Notification::NetworkNotFound));
        buffer.push(LinkAction::FlushCatalog);

        assert!(buffer.contains_radio(RadioCommand::StartScan));
        assert!(buffer.contains_notification(Notification::NetworkNotFound));
        assert_eq!(buffer.radio_commands().count(), 1);
        assert_eq!(buffer.notifications().count(), 1);
    }
}
