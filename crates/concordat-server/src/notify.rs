//! Push notifications for live observers.
//!
//! A single broadcast channel fans out save-scoped notifications to every
//! connected WebSocket client so frontends can refresh without polling.
//! Send failures mean nobody is listening and are ignored.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use concordat_protocol::Action;

/// Events pushed to observers around state mutations.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    ActionSubmitted {
        save_id: String,
        action: Action,
    },
    DiplomaticMessage {
        save_id: String,
        chat_id: String,
        responding_nations: Vec<String>,
    },
    TimeAdvanceStart {
        save_id: String,
        time_jump: String,
    },
    TimeAdvanceComplete {
        save_id: String,
        turn_number: u32,
        event_count: usize,
    },
}

/// Cloneable handle around the broadcast channel.
#[derive(Clone, Debug)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, notification: Notification) {
        // No subscribers is fine.
        let _ = self.sender.send(notification);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}
