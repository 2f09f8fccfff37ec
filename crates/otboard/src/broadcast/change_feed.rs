//! Broadcast channel for committed work order changes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    /// All work order data was replaced from a backup.
    Restored,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Created => write!(f, "created"),
            ChangeKind::Updated => write!(f, "updated"),
            ChangeKind::Restored => write!(f, "restored"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Empty for `Restored`.
    pub work_order_id: String,
    pub ot: String,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn created(work_order_id: &str, ot: &str) -> Self {
        Self::new(ChangeKind::Created, work_order_id, ot)
    }

    pub fn updated(work_order_id: &str, ot: &str) -> Self {
        Self::new(ChangeKind::Updated, work_order_id, ot)
    }

    pub fn restored() -> Self {
        Self::new(ChangeKind::Restored, "", "")
    }

    fn new(kind: ChangeKind, work_order_id: &str, ot: &str) -> Self {
        Self {
            kind,
            work_order_id: work_order_id.to_string(),
            ot: ot.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Broadcasts change events to every subscriber.
#[derive(Clone)]
pub struct ChangeFeed {
    sender: Arc<broadcast::Sender<ChangeEvent>>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn publish(&self, event: ChangeEvent) {
        log::debug!("Publishing {} event for OT {}", event.kind, event.ot);
        // No active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}
