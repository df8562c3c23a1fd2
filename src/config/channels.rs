use embassy_sync::{
    blocking_mutex::raw::NoopRawMutex,
    channel::{Channel, TrySendError},
};

use crate::types::DriverEvent;

pub const MAILBOX_DEPTH: usize = 8;

/// A driver event stamped with the time it was observed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimedEvent {
    pub event: DriverEvent,
    pub now_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MailboxError {
    Full,
}

impl MailboxError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "mailbox full",
        }
    }
}

impl core::fmt::Display for MailboxError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializes driver callbacks onto the task that owns the dispatcher.
pub struct EventMailbox {
    channel: Channel<NoopRawMutex, TimedEvent, MAILBOX_DEPTH>,
}

impl EventMailbox {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    pub fn post(&self, event: DriverEvent, now_ms: u64) -> Result<(), MailboxError> {
        self.channel
            .try_send(TimedEvent { event, now_ms })
            .map_err(|TrySendError::Full(_)| MailboxError::Full)
    }

    pub fn try_take(&self) -> Option<TimedEvent> {
        self.channel.try_receive().ok()
    }

    pub async fn take(&self) -> TimedEvent {
        self.channel.receive().await
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl Default for EventMailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_rejects_when_full() {
        let mailbox = EventMailbox::new();
        for now_ms in 0..MAILBOX_DEPTH as u64 {
            assert!(mailbox.post(DriverEvent::PortAuthorized, now_ms).is_ok());
        }
        assert_eq!(
            mailbox.post(DriverEvent::PortAuthorized, 99),
            Err(MailboxError::Full)
        );
        assert_eq!(mailbox.len(), MAILBOX_DEPTH);
    }

    #[test]
    fn take_preserves_delivery_order() {
        let mailbox = EventMailbox::new();
        mailbox.post(DriverEvent::InterfaceDisabled, 1).unwrap();
        mailbox.post(DriverEvent::InterfaceEnabled, 2).unwrap();
        let first = embassy_futures::block_on(mailbox.take());
        assert_eq!(first.now_ms, 1);
        assert!(matches!(first.event, DriverEvent::InterfaceDisabled));
        let second = mailbox.try_take().unwrap();
        assert!(matches!(second.event, DriverEvent::InterfaceEnabled));
        assert!(mailbox.is_empty());
    }
}
