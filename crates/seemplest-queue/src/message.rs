//! Message views handed to queue consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message as seen by `peek_messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub id: String,
    pub content: String,
    pub insertion_time: DateTime<Utc>,
    pub expiration_time: DateTime<Utc>,
    /// Number of times the message has been popped.
    pub dequeue_count: u32,
}

/// A message as seen by `get_messages`: the queued view plus the lease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoppedMessage {
    #[serde(flatten)]
    pub message: QueuedMessage,
    /// When the message becomes visible to other consumers again.
    pub next_visible_time: DateTime<Utc>,
    /// Proof of this pop; required to delete the message.
    pub pop_receipt: String,
}

impl PoppedMessage {
    pub fn id(&self) -> &str {
        &self.message.id
    }

    pub fn content(&self) -> &str {
        &self.message.content
    }

    pub fn dequeue_count(&self) -> u32 {
        self.message.dequeue_count
    }
}

/// Internal record: the popped shape with "never popped" sentinels.
#[derive(Debug, Clone)]
pub(crate) struct StoredMessage {
    pub message: QueuedMessage,
    pub next_visible_time: DateTime<Utc>,
    pub pop_receipt: Option<String>,
    /// Insertion order, used to break insertion-time ties.
    pub sequence: u64,
}

impl StoredMessage {
    pub fn new(message: QueuedMessage, sequence: u64) -> Self {
        Self {
            message,
            next_visible_time: DateTime::<Utc>::MIN_UTC,
            pop_receipt: None,
            sequence,
        }
    }

    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        now > self.next_visible_time && now < self.message.expiration_time
    }

    /// Whether `(id, receipt)` names the current lease and it has not lapsed.
    pub fn is_leased_by(&self, id: &str, receipt: &str, now: DateTime<Utc>) -> bool {
        self.message.id == id
            && self.pop_receipt.as_deref() == Some(receipt)
            && self.next_visible_time >= now
    }

    /// Take a new lease and return a detached copy of the result.
    pub fn pop(&mut self, receipt: String, next_visible_time: DateTime<Utc>) -> PoppedMessage {
        self.message.dequeue_count = self.message.dequeue_count.saturating_add(1);
        self.next_visible_time = next_visible_time;
        self.pop_receipt = Some(receipt.clone());
        PoppedMessage {
            message: self.message.clone(),
            next_visible_time,
            pop_receipt: receipt,
        }
    }
}
