//! # seemplest-tracking
//!
//! Field-level change tracking for persisted records.
//!
//! This crate provides:
//! - `FieldValue` (the value domain of a record column)
//! - `RecordDescriptor`, `Record` and `DataRecord` (runtime record mapping)
//! - `PrimaryKeyValue` (canonical composite key)
//! - `FieldChange` and `RecordChangeSet` (deltas for one record)
//! - `TableChangeSet` and `DatabaseChangeSet` (roll-ups per table and per
//!   unit of work)
//!
//! Change-sets carry no locking. Build one per unit of work, prune it, hand
//! it to the consumer, drop it.
//!
//! ## Data model
//!
//! ```text
//! DatabaseChangeSet        table name -> TableChangeSet
//!     │
//! TableChangeSet           PrimaryKeyValue -> RecordChangeSet
//!     │
//! RecordChangeSet          field name -> FieldChange (+ state, issues)
//! ```

pub mod change;
pub mod change_set;
pub mod error;
pub mod primary_key;
pub mod record;
pub mod value;

pub use change::{ChangedRecordState, FieldChange, RecordChangeSet, TrackingIssue};
pub use change_set::{DatabaseChangeSet, TableChangeSet};
pub use error::TrackingError;
pub use primary_key::PrimaryKeyValue;
pub use record::{DataRecord, FieldDescriptor, Record, RecordDescriptor};
pub use value::FieldValue;
