//! Field deltas for a single record instance.

use crate::record::Record;
use crate::value::FieldValue;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Previous and new value of one field.
///
/// `None` and `Some(FieldValue::Null)` both mean "absent".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub previous_value: Option<FieldValue>,
    pub new_value: Option<FieldValue>,
}

impl FieldChange {
    pub fn new(previous_value: Option<FieldValue>, new_value: Option<FieldValue>) -> Self {
        Self {
            previous_value,
            new_value,
        }
    }

    /// A change is real when exactly one side is absent, or both are
    /// present and unequal.
    pub fn is_changed(&self) -> bool {
        match (present(&self.previous_value), present(&self.new_value)) {
            (None, None) => false,
            (Some(previous), Some(new)) => previous != new,
            _ => true,
        }
    }
}

fn present(value: &Option<FieldValue>) -> Option<&FieldValue> {
    value.as_ref().filter(|v| !v.is_null())
}

/// Lifecycle state of a tracked record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedRecordState {
    Attached,
    Inserted,
    Updated,
    Deleted,
}

/// Advisory note about an anomaly seen while tracking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingIssue {
    pub table_name: String,
    /// Copy of the offending record's column values.
    pub record: BTreeMap<String, FieldValue>,
    pub description: String,
}

impl TrackingIssue {
    pub fn new(record: &impl Record, description: impl Into<String>) -> Self {
        Self {
            table_name: record.descriptor().table_name().to_string(),
            record: record.snapshot(),
            description: description.into(),
        }
    }
}

/// Field name to delta mapping for one record, plus its state and issues.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordChangeSet {
    state: ChangedRecordState,
    created_at: DateTime<Utc>,
    fields: BTreeMap<String, FieldChange>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    issues: Vec<TrackingIssue>,
}

impl RecordChangeSet {
    pub fn new(state: ChangedRecordState) -> Self {
        Self::new_at(state, Utc::now())
    }

    pub fn new_at(state: ChangedRecordState, created_at: DateTime<Utc>) -> Self {
        Self {
            state,
            created_at,
            fields: BTreeMap::new(),
            issues: Vec::new(),
        }
    }

    /// Delta between two versions of the same record, one entry per column.
    ///
    /// Unchanged columns are recorded too; run
    /// [`RecordChangeSet::eliminate_non_changed_fields`] to drop them.
    pub fn from_records(previous: &impl Record, new: &impl Record) -> Self {
        let mut change_set = Self::new(ChangedRecordState::Updated);
        for field in new.descriptor().fields() {
            change_set.record_change(
                &field.name,
                previous.field_value(&field.name),
                new.field_value(&field.name),
            );
        }
        change_set
    }

    /// Every set column of `record` as a change from absent.
    pub fn inserted(record: &impl Record) -> Self {
        let mut change_set = Self::new(ChangedRecordState::Inserted);
        for (name, value) in record.snapshot() {
            change_set.record_change(&name, None, Some(value));
        }
        change_set
    }

    /// Every set column of `record` as a change to absent.
    pub fn deleted(record: &impl Record) -> Self {
        let mut change_set = Self::new(ChangedRecordState::Deleted);
        for (name, value) in record.snapshot() {
            change_set.record_change(&name, Some(value), None);
        }
        change_set
    }

    pub fn state(&self) -> ChangedRecordState {
        self.state
    }

    pub fn set_state(&mut self, state: ChangedRecordState) {
        self.state = state;
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Store the delta for `field`.
    ///
    /// A second change to the same field keeps the first previous value and
    /// takes the latest new value: `previous_value` is ignored when `field`
    /// already has a delta, so the entry always spans the whole unit of work.
    pub fn record_change(
        &mut self,
        field: &str,
        previous_value: Option<FieldValue>,
        new_value: Option<FieldValue>,
    ) {
        match self.fields.get_mut(field) {
            Some(existing) => existing.new_value = new_value,
            None => {
                self.fields.insert(
                    field.to_string(),
                    FieldChange::new(previous_value, new_value),
                );
            }
        }
    }

    pub fn field_change(&self, field: &str) -> Option<&FieldChange> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldChange)> {
        self.fields.iter().map(|(name, change)| (name.as_str(), change))
    }

    /// Names of fields whose delta is real.
    pub fn changed_field_names(&self) -> Vec<&str> {
        self.fields()
            .filter(|(_, change)| change.is_changed())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Drop every field whose delta is not real.
    ///
    /// Returns `false` without touching the mapping when every entry is a
    /// real change.
    pub fn eliminate_non_changed_fields(&mut self) -> bool {
        let any_change = self.fields.values().any(|change| !change.is_changed());
        if !any_change {
            return false;
        }
        self.fields.retain(|_, change| change.is_changed());
        true
    }

    pub fn add_issue(&mut self, issue: TrackingIssue) {
        tracing::debug!(
            table = %issue.table_name,
            description = %issue.description,
            "tracking issue recorded"
        );
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[TrackingIssue] {
        &self.issues
    }
}
