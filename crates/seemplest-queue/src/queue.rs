//! Capability surface shared by queue implementations.

use crate::error::QueueError;
use crate::message::{PoppedMessage, QueuedMessage};
use std::sync::Arc;

/// At-least-once queue with visibility timeouts.
pub trait Queue: Send + Sync {
    /// Add a message that expires `time_to_live_seconds` from now.
    fn put_message(&self, content: &str, time_to_live_seconds: i64) -> Result<(), QueueError>;

    /// Lease up to `count` visible messages for `visibility_timeout_seconds`.
    fn get_messages(
        &self,
        count: usize,
        visibility_timeout_seconds: i64,
    ) -> Result<Vec<PoppedMessage>, QueueError>;

    /// Look at up to `count` visible messages without leasing them.
    fn peek_messages(&self, count: usize) -> Result<Vec<QueuedMessage>, QueueError>;

    /// Delete a leased message.
    ///
    /// Returns `Ok(false)` when the receipt does not match a live lease.
    fn delete_message(&self, message: &PoppedMessage) -> Result<bool, QueueError>;

    fn clear(&self) -> Result<(), QueueError>;

    /// Count of stored messages, including leased and expired ones.
    fn approximate_message_count(&self) -> Result<usize, QueueError>;
}

/// A queue registered under a name with a provider.
pub trait NamedQueue: Queue {
    fn name(&self) -> &str;

    /// Whether the provider has deleted this queue.
    fn is_deleted(&self) -> bool;
}

/// Registry owning the lifecycle of named queues.
pub trait NamedQueueProvider: Send + Sync {
    type Queue: NamedQueue;

    fn get_queue(&self, name: &str) -> Option<Arc<Self::Queue>>;

    fn list_queues(&self) -> Vec<Arc<Self::Queue>>;

    /// Register a new queue; fails when the name is taken.
    fn create_queue(&self, name: &str) -> Result<Arc<Self::Queue>, QueueError>;

    /// Unregister and tombstone a queue. Returns `false` for unknown names.
    fn delete_queue(&self, name: &str) -> bool;
}
