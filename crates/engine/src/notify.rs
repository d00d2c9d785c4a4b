//! Best-effort user notifications.
//!
//! Dispatch is non-blocking and carries no result channel: callers must not
//! depend on delivery. A user with no open stream simply misses the message.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A small payload delivered over the per-user event stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Event discriminator, e.g. `"recurring_transaction"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl Notification {
    pub fn recurring_transaction(rule_name: &str, amount: f64) -> Self {
        Self {
            kind: "recurring_transaction".to_string(),
            message: format!("Recurring transaction \"{rule_name}\" was posted"),
            amount: Some(amount),
        }
    }
}

pub trait Notifier {
    /// Fire-and-forget dispatch to one user. Never blocks, never fails.
    fn send_to_user(&self, user_id: &str, notification: Notification);
}

/// In-process notifier backed by one broadcast channel per user.
///
/// Channels are created lazily on first subscribe or first send. Lagging
/// subscribers drop old messages; that is acceptable for this payload.
#[derive(Clone, Debug, Default)]
pub struct ChannelNotifier {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<Notification>>>>,
}

const CHANNEL_CAPACITY: usize = 64;

impl ChannelNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a receiver for a user's notifications.
    pub fn subscribe(&self, user_id: &str) -> broadcast::Receiver<Notification> {
        if let Ok(channels) = self.channels.read()
            && let Some(sender) = channels.get(user_id)
        {
            return sender.subscribe();
        }

        let (sender, receiver) = broadcast::channel(CHANNEL_CAPACITY);
        match self.channels.write() {
            Ok(mut channels) => {
                channels
                    .entry(user_id.to_string())
                    .or_insert(sender)
                    .subscribe()
            }
            // Poisoned lock: fall back to a detached receiver rather than
            // propagate a panic into the caller.
            Err(_) => receiver,
        }
    }
}

impl Notifier for ChannelNotifier {
    fn send_to_user(&self, user_id: &str, notification: Notification) {
        let Ok(channels) = self.channels.read() else {
            return;
        };
        if let Some(sender) = channels.get(user_id) {
            // A send with zero receivers returns Err; that is fine here.
            let _ = sender.send(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_receives_sent_notification() {
        let notifier = ChannelNotifier::new();
        let mut rx = notifier.subscribe("alice");

        notifier.send_to_user("alice", Notification::recurring_transaction("Rent", 800.0));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, "recurring_transaction");
        assert_eq!(event.amount, Some(800.0));
        assert!(event.message.contains("Rent"));
    }

    #[test]
    fn send_without_subscriber_is_a_no_op() {
        let notifier = ChannelNotifier::new();
        notifier.send_to_user("nobody", Notification::recurring_transaction("Rent", 1.0));
    }

    #[test]
    fn users_do_not_see_each_others_events() {
        let notifier = ChannelNotifier::new();
        let mut alice = notifier.subscribe("alice");
        let mut bob = notifier.subscribe("bob");

        notifier.send_to_user("alice", Notification::recurring_transaction("Rent", 1.0));

        assert!(alice.try_recv().is_ok());
        assert!(bob.try_recv().is_err());
    }

    #[test]
    fn notification_serializes_with_type_field() {
        let json =
            serde_json::to_value(Notification::recurring_transaction("Rent", 800.0)).unwrap();
        assert_eq!(json["type"], "recurring_transaction");
        assert_eq!(json["amount"], 800.0);
    }
}
