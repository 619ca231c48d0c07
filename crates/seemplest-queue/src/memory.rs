//! Mutex-guarded in-memory named queue.
//!
//! All reads and writes go through one lock per queue, so each queue
//! behaves as a serialized actor: concurrent `get_messages` calls never
//! lease the same message twice.

use crate::clock::{Clock, SystemClock};
use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::message::{PoppedMessage, QueuedMessage, StoredMessage};
use crate::queue::{NamedQueue, Queue};
use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, MutexGuard};
use std::cmp::Reverse;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Default)]
struct QueueState {
    messages: Vec<StoredMessage>,
    next_sequence: u64,
    deleted: bool,
}

impl QueueState {
    /// Indices of visible messages, newest first, at most `limit`.
    fn visible_indices(&self, now: DateTime<Utc>, limit: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .messages
            .iter()
            .enumerate()
            .filter(|(_, message)| message.is_visible_at(now))
            .map(|(index, _)| index)
            .collect();
        indices.sort_by_key(|&index| {
            let message = &self.messages[index];
            Reverse((message.message.insertion_time, message.sequence))
        });
        indices.truncate(limit);
        indices
    }
}

/// In-memory queue registered with a `MemoryNamedQueueProvider`.
#[derive(Debug)]
pub struct MemoryNamedQueue {
    name: String,
    config: QueueConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<QueueState>,
}

impl MemoryNamedQueue {
    /// Standalone queue with default config and the system clock.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_parts(name, QueueConfig::default(), Arc::new(SystemClock))
    }

    pub fn with_parts(
        name: impl Into<String>,
        config: QueueConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            clock,
            state: Mutex::new(QueueState::default()),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Put with the configured default time to live.
    pub fn put(&self, content: &str) -> Result<(), QueueError> {
        self.put_message(content, self.config.default_time_to_live_seconds)
    }

    /// Get with the configured default visibility timeout.
    pub fn get(&self, count: usize) -> Result<Vec<PoppedMessage>, QueueError> {
        self.get_messages(count, self.config.default_visibility_timeout_seconds)
    }

    /// Clear and tombstone the queue. Only the provider calls this.
    pub(crate) fn delete_queue(&self) {
        let mut state = self.state.lock();
        state.messages.clear();
        state.deleted = true;
    }

    /// Lock the state, failing once the queue is tombstoned.
    fn lock_live(&self) -> Result<MutexGuard<'_, QueueState>, QueueError> {
        let state = self.state.lock();
        if state.deleted {
            return Err(QueueError::QueueDeleted {
                name: self.name.clone(),
            });
        }
        Ok(state)
    }

    fn batch_limit(&self, count: usize) -> usize {
        count.min(self.config.max_messages_per_get)
    }
}

fn offset(
    now: DateTime<Utc>,
    seconds: i64,
    invalid: fn(i64) -> QueueError,
) -> Result<DateTime<Utc>, QueueError> {
    if seconds < 0 {
        return Err(invalid(seconds));
    }
    Duration::try_seconds(seconds)
        .and_then(|duration| now.checked_add_signed(duration))
        .ok_or(QueueError::TimestampOverflow(seconds))
}

impl Queue for MemoryNamedQueue {
    fn put_message(&self, content: &str, time_to_live_seconds: i64) -> Result<(), QueueError> {
        let mut state = self.lock_live()?;
        let now = self.clock.now();
        let expiration_time = offset(now, time_to_live_seconds, QueueError::InvalidTimeToLive)?;

        let id = Uuid::new_v4().to_string();
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.messages.push(StoredMessage::new(
            QueuedMessage {
                id: id.clone(),
                content: content.to_string(),
                insertion_time: now,
                expiration_time,
                dequeue_count: 0,
            },
            sequence,
        ));

        tracing::trace!(queue = %self.name, message_id = %id, "message put");
        Ok(())
    }

    fn get_messages(
        &self,
        count: usize,
        visibility_timeout_seconds: i64,
    ) -> Result<Vec<PoppedMessage>, QueueError> {
        let mut state = self.lock_live()?;
        let now = self.clock.now();
        let next_visible_time = offset(
            now,
            visibility_timeout_seconds,
            QueueError::InvalidVisibilityTimeout,
        )?;

        let selected = state.visible_indices(now, self.batch_limit(count));
        let popped: Vec<PoppedMessage> = selected
            .into_iter()
            .map(|index| state.messages[index].pop(Uuid::new_v4().to_string(), next_visible_time))
            .collect();

        tracing::trace!(queue = %self.name, popped = popped.len(), "messages leased");
        Ok(popped)
    }

    fn peek_messages(&self, count: usize) -> Result<Vec<QueuedMessage>, QueueError> {
        let state = self.lock_live()?;
        let now = self.clock.now();
        Ok(state
            .visible_indices(now, self.batch_limit(count))
            .into_iter()
            .map(|index| state.messages[index].message.clone())
            .collect())
    }

    fn delete_message(&self, message: &PoppedMessage) -> Result<bool, QueueError> {
        let mut state = self.lock_live()?;
        let now = self.clock.now();
        let position = state
            .messages
            .iter()
            .position(|stored| stored.is_leased_by(message.id(), &message.pop_receipt, now));

        match position {
            Some(index) => {
                state.messages.swap_remove(index);
                tracing::debug!(queue = %self.name, message_id = %message.id(), "message deleted");
                Ok(true)
            }
            None => {
                tracing::debug!(
                    queue = %self.name,
                    message_id = %message.id(),
                    "delete ignored: no live lease for receipt"
                );
                Ok(false)
            }
        }
    }

    fn clear(&self) -> Result<(), QueueError> {
        let mut state = self.lock_live()?;
        state.messages.clear();
        Ok(())
    }

    fn approximate_message_count(&self) -> Result<usize, QueueError> {
        Ok(self.lock_live()?.messages.len())
    }
}

impl NamedQueue for MemoryNamedQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_deleted(&self) -> bool {
        self.state.lock().deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;

    fn queue_with_clock() -> (MemoryNamedQueue, Arc<ManualClock>) {
        let start = Utc
            .with_ymd_and_hms(2024, 3, 1, 8, 0, 0)
            .single()
            .expect("valid timestamp");
        let clock = Arc::new(ManualClock::new(start));
        let queue = MemoryNamedQueue::with_parts("jobs", QueueConfig::default(), clock.clone());
        (queue, clock)
    }

    fn tick(clock: &ManualClock) {
        clock.advance(Duration::milliseconds(1));
    }

    #[test]
    fn put_counts_messages() {
        let (queue, _clock) = queue_with_clock();
        for content in ["content1", "content2", "content3"] {
            queue.put_message(content, 30).expect("put should succeed");
        }
        assert_eq!(queue.approximate_message_count().expect("count"), 3);
    }

    #[test]
    fn get_returns_newest_first() {
        let (queue, clock) = queue_with_clock();
        queue.put_message("first", 30).expect("put");
        tick(&clock);
        queue.put_message("second", 30).expect("put");
        queue.put_message("third", 30).expect("put");
        tick(&clock);

        let contents: Vec<String> = queue
            .get_messages(3, 10)
            .expect("get")
            .into_iter()
            .map(|m| m.message.content)
            .collect();
        assert_eq!(contents, vec!["third", "second", "first"]);
    }

    #[test]
    fn leased_messages_are_hidden_until_timeout() {
        let (queue, clock) = queue_with_clock();
        queue.put_message("job", 60).expect("put");
        tick(&clock);

        let first = queue.get_messages(5, 10).expect("get");
        assert_eq!(first.len(), 1);
        assert!(queue.get_messages(5, 10).expect("get").is_empty());
        assert!(queue.peek_messages(5).expect("peek").is_empty());

        clock.advance(Duration::seconds(10));
        assert!(queue.get_messages(5, 10).expect("get").is_empty());
        tick(&clock);
        let again = queue.get_messages(5, 10).expect("get");
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].id(), first[0].id());
        assert_eq!(again[0].dequeue_count(), 2);
        assert_ne!(again[0].pop_receipt, first[0].pop_receipt);
    }

    #[test]
    fn peek_does_not_lease() {
        let (queue, clock) = queue_with_clock();
        queue.put_message("job", 60).expect("put");
        tick(&clock);

        let peeked = queue.peek_messages(1).expect("peek");
        assert_eq!(peeked[0].dequeue_count, 0);
        let popped = queue.get_messages(1, 10).expect("get");
        assert_eq!(popped[0].id(), peeked[0].id);
        assert_eq!(popped[0].dequeue_count(), 1);
    }

    #[test]
    fn expired_messages_are_skipped_but_counted() {
        let (queue, clock) = queue_with_clock();
        queue.put_message("short", 1).expect("put");
        clock.advance(Duration::seconds(2));

        assert!(queue.get_messages(1, 10).expect("get").is_empty());
        assert_eq!(queue.approximate_message_count().expect("count"), 1);
    }

    #[test]
    fn delete_requires_live_lease() {
        let (queue, clock) = queue_with_clock();
        queue.put_message("job", 60).expect("put");
        tick(&clock);

        let popped = queue.get_messages(1, 5).expect("get").remove(0);
        let mut forged = popped.clone();
        forged.pop_receipt = "forged".to_string();
        assert!(!queue.delete_message(&forged).expect("delete"));

        assert!(queue.delete_message(&popped).expect("delete"));
        assert_eq!(queue.approximate_message_count().expect("count"), 0);
    }

    #[test]
    fn stale_receipt_delete_is_a_no_op() {
        let (queue, clock) = queue_with_clock();
        queue.put_message("job", 60).expect("put");
        tick(&clock);

        let popped = queue.get_messages(1, 5).expect("get").remove(0);
        clock.advance(Duration::seconds(6));

        assert!(!queue.delete_message(&popped).expect("delete"));
        let again = queue.get_messages(1, 5).expect("get");
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].id(), popped.id());
    }

    #[test]
    fn batch_is_capped_by_config() {
        let clock = Arc::new(ManualClock::default());
        let config = QueueConfig {
            max_messages_per_get: 2,
            ..QueueConfig::default()
        };
        let queue = MemoryNamedQueue::with_parts("capped", config, clock.clone());
        for n in 0..5 {
            queue.put_message(&format!("m{n}"), 60).expect("put");
        }
        tick(&clock);

        assert_eq!(queue.get_messages(10, 5).expect("get").len(), 2);
        assert_eq!(queue.peek_messages(10).expect("peek").len(), 2);
    }

    #[test]
    fn rejects_negative_durations() {
        let (queue, _clock) = queue_with_clock();
        assert_eq!(
            queue.put_message("x", -1).expect_err("negative ttl"),
            QueueError::InvalidTimeToLive(-1)
        );
        assert_eq!(
            queue.get_messages(1, -5).expect_err("negative timeout"),
            QueueError::InvalidVisibilityTimeout(-5)
        );
        assert!(matches!(
            queue.put_message("x", i64::MAX).expect_err("overflow"),
            QueueError::TimestampOverflow(_)
        ));
    }

    #[test]
    fn defaults_come_from_config() {
        let (queue, clock) = queue_with_clock();
        queue.put("job").expect("put");
        tick(&clock);

        let popped = queue.get(1).expect("get").remove(0);
        assert_eq!(
            popped.message.expiration_time - popped.message.insertion_time,
            Duration::seconds(queue.config().default_time_to_live_seconds)
        );
        assert_eq!(
            popped.next_visible_time,
            clock.now() + Duration::seconds(queue.config().default_visibility_timeout_seconds)
        );
    }

    #[test]
    fn deleted_queue_rejects_everything() {
        let (queue, _clock) = queue_with_clock();
        queue.put_message("job", 60).expect("put");
        queue.delete_queue();

        assert!(queue.is_deleted());
        let deleted = QueueError::QueueDeleted {
            name: "jobs".to_string(),
        };
        assert_eq!(queue.put_message("x", 1).expect_err("put"), deleted);
        assert_eq!(queue.get_messages(1, 1).expect_err("get"), deleted);
        assert_eq!(queue.peek_messages(1).expect_err("peek"), deleted);
        assert_eq!(queue.clear().expect_err("clear"), deleted);
        assert_eq!(
            queue.approximate_message_count().expect_err("count"),
            deleted
        );
    }
}
