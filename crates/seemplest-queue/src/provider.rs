//! Registry of in-memory named queues.

use crate::clock::{Clock, SystemClock};
use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::memory::MemoryNamedQueue;
use crate::queue::NamedQueueProvider;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Owns every `MemoryNamedQueue` by name.
///
/// The registry lock is separate from each queue's lock, so a handle taken
/// before `delete_queue` keeps working until the delete completes and fails
/// with `QueueError::QueueDeleted` afterwards.
#[derive(Debug)]
pub struct MemoryNamedQueueProvider {
    config: QueueConfig,
    clock: Arc<dyn Clock>,
    queues: Mutex<BTreeMap<String, Arc<MemoryNamedQueue>>>,
}

impl Default for MemoryNamedQueueProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNamedQueueProvider {
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            queues: Mutex::new(BTreeMap::new()),
        }
    }

    /// Replace the time source handed to queues created from now on.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Number of registered queues.
    pub fn len(&self) -> usize {
        self.queues.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.lock().is_empty()
    }
}

impl NamedQueueProvider for MemoryNamedQueueProvider {
    type Queue = MemoryNamedQueue;

    fn get_queue(&self, name: &str) -> Option<Arc<MemoryNamedQueue>> {
        self.queues.lock().get(name).cloned()
    }

    /// Snapshot of registered queues in name order.
    fn list_queues(&self) -> Vec<Arc<MemoryNamedQueue>> {
        self.queues.lock().values().cloned().collect()
    }

    fn create_queue(&self, name: &str) -> Result<Arc<MemoryNamedQueue>, QueueError> {
        if name.trim().is_empty() {
            return Err(QueueError::InvalidQueueName(name.to_string()));
        }

        let mut queues = self.queues.lock();
        if queues.contains_key(name) {
            return Err(QueueError::QueueAlreadyExists(name.to_string()));
        }

        let queue = Arc::new(MemoryNamedQueue::with_parts(
            name,
            self.config.clone(),
            Arc::clone(&self.clock),
        ));
        queues.insert(name.to_string(), Arc::clone(&queue));
        tracing::debug!(queue = %name, "queue created");
        Ok(queue)
    }

    fn delete_queue(&self, name: &str) -> bool {
        let mut queues = self.queues.lock();
        match queues.remove(name) {
            Some(queue) => {
                queue.delete_queue();
                tracing::debug!(queue = %name, "queue deleted");
                true
            }
            None => false,
        }
    }
}
