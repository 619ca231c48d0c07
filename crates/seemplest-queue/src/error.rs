//! Error types for queue and provider operations.

/// Errors raised by queue and provider operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("queue {name} has been deleted")]
    QueueDeleted { name: String },

    #[error("queue already exists: {0}")]
    QueueAlreadyExists(String),

    #[error("invalid queue name: {0:?}")]
    InvalidQueueName(String),

    #[error("time to live must be non-negative (got {0}s)")]
    InvalidTimeToLive(i64),

    #[error("visibility timeout must be non-negative (got {0}s)")]
    InvalidVisibilityTimeout(i64),

    #[error("duration of {0}s overflowed timestamp range")]
    TimestampOverflow(i64),
}

/// Errors raised while loading queue configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml: {0}")]
    ParseToml(#[from] toml::de::Error),

    #[error("invalid queue config: {0}")]
    Invalid(String),
}
