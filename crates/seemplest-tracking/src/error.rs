//! Error types for change-tracking operations.

/// Errors raised while building keys or populating records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackingError {
    /// A primary key was built from zero components.
    #[error("primary key has no components")]
    EmptyPrimaryKey,

    /// A key component is null and has no canonical form.
    #[error("primary key component {index} is null")]
    NullKeyComponent { index: usize },

    /// The record type declares no primary-key field.
    #[error("table {table} declares no primary key")]
    NoPrimaryKey { table: String },

    /// A primary-key field has no value on the record instance.
    #[error("primary key field {table}.{field} has no value")]
    MissingKeyField { table: String, field: String },

    /// The field is not part of the record descriptor.
    #[error("unknown field {table}.{field}")]
    UnknownField { table: String, field: String },
}
