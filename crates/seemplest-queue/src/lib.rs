//! # seemplest-queue
//!
//! In-process named queues with at-least-once delivery.
//!
//! This crate provides:
//! - `QueuedMessage` / `PoppedMessage` (the message views)
//! - `Queue`, `NamedQueue`, `NamedQueueProvider` (the capability surface)
//! - `MemoryNamedQueue` and `MemoryNamedQueueProvider` (mutex-guarded
//!   in-memory implementations)
//! - `QueueConfig` (TOML-loadable defaults) and `Clock`
//!
//! Intended for tests and low-volume use: every operation holds the queue
//! lock for a full scan of the message set.
//!
//! ## Message lifecycle
//!
//! ```text
//! put ──► visible ──get──► leased (until now + visibility timeout)
//!            ▲                 │
//!            └──lease expires──┤
//!                              └──delete(id, pop receipt)──► gone
//! ```
//!
//! Messages past their expiration time are never returned but stay in
//! memory until the queue is cleared.

pub mod clock;
pub mod config;
pub mod error;
pub mod memory;
pub mod message;
pub mod provider;
pub mod queue;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    DEFAULT_MAX_MESSAGES_PER_GET, DEFAULT_TIME_TO_LIVE_SECONDS,
    DEFAULT_VISIBILITY_TIMEOUT_SECONDS, QueueConfig,
};
pub use error::{ConfigError, QueueError};
pub use memory::MemoryNamedQueue;
pub use message::{PoppedMessage, QueuedMessage};
pub use provider::MemoryNamedQueueProvider;
pub use queue::{NamedQueue, NamedQueueProvider, Queue};
