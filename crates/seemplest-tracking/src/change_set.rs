//! Per-table and per-unit-of-work roll-ups of record change-sets.

use crate::change::{ChangedRecordState, RecordChangeSet};
use crate::error::TrackingError;
use crate::primary_key::PrimaryKeyValue;
use crate::record::Record;
use serde::Serialize;
use std::collections::BTreeMap;

/// Primary key to record change-set mapping for one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableChangeSet {
    table_name: String,
    records: BTreeMap<PrimaryKeyValue, RecordChangeSet>,
}

impl TableChangeSet {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            records: BTreeMap::new(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Insert or replace the change-set for `key`.
    ///
    /// Returns previous value if present.
    pub fn insert(
        &mut self,
        key: PrimaryKeyValue,
        change_set: RecordChangeSet,
    ) -> Option<RecordChangeSet> {
        self.records.insert(key, change_set)
    }

    pub fn record(&self, key: &PrimaryKeyValue) -> Option<&RecordChangeSet> {
        self.records.get(key)
    }

    pub fn record_mut(&mut self, key: &PrimaryKeyValue) -> Option<&mut RecordChangeSet> {
        self.records.get_mut(key)
    }

    /// Change-set for `key`, created in `state` when missing.
    pub fn record_or_insert(
        &mut self,
        key: PrimaryKeyValue,
        state: ChangedRecordState,
    ) -> &mut RecordChangeSet {
        self.records
            .entry(key)
            .or_insert_with(|| RecordChangeSet::new(state))
    }

    pub fn records(&self) -> impl Iterator<Item = (&PrimaryKeyValue, &RecordChangeSet)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Prune non-real field deltas from every record.
    pub fn eliminate_non_changed_fields(&mut self) -> bool {
        let mut any_change = false;
        for change_set in self.records.values_mut() {
            any_change |= change_set.eliminate_non_changed_fields();
        }
        any_change
    }

    /// Drop attached or updated records that have no field deltas left.
    ///
    /// Inserted and deleted rows are changes on their own and always stay.
    pub fn eliminate_unchanged_records(&mut self) -> bool {
        let any_change = self.records.values().any(is_unchanged_record);
        if !any_change {
            return false;
        }
        self.records.retain(|_, change_set| !is_unchanged_record(change_set));
        true
    }
}

fn is_unchanged_record(change_set: &RecordChangeSet) -> bool {
    matches!(
        change_set.state(),
        ChangedRecordState::Attached | ChangedRecordState::Updated
    ) && change_set.is_empty()
}

/// Table name to table change-set mapping for one unit of work.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DatabaseChangeSet {
    tables: BTreeMap<String, TableChangeSet>,
}

impl DatabaseChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, table_name: &str) -> Option<&TableChangeSet> {
        self.tables.get(table_name)
    }

    /// Table change-set for `table_name`, created empty when missing.
    pub fn table_mut(&mut self, table_name: &str) -> &mut TableChangeSet {
        self.tables
            .entry(table_name.to_string())
            .or_insert_with(|| TableChangeSet::new(table_name))
    }

    /// Insert or replace a whole table change-set.
    pub fn add_table(&mut self, table: TableChangeSet) -> Option<TableChangeSet> {
        self.tables.insert(table.table_name.clone(), table)
    }

    /// File `change_set` under the record's table and primary key.
    ///
    /// Returns the change-set previously tracked for the same row, if any.
    pub fn track(
        &mut self,
        record: &impl Record,
        change_set: RecordChangeSet,
    ) -> Result<Option<RecordChangeSet>, TrackingError> {
        let key = PrimaryKeyValue::from_record(record)?;
        let table_name = record.descriptor().table_name();
        Ok(self.table_mut(table_name).insert(key, change_set))
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableChangeSet> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Remove tables whose row mapping is empty.
    ///
    /// Returns `false` without touching the mapping when no table is empty.
    pub fn eliminate_unchanged_tables(&mut self) -> bool {
        let any_change = self.tables.values().any(TableChangeSet::is_empty);
        if !any_change {
            return false;
        }
        self.tables.retain(|_, table| !table.is_empty());
        true
    }

    /// Prune fields, then records, then tables.
    ///
    /// Returns whether any pass removed something.
    pub fn prune(&mut self) -> bool {
        let mut any_change = false;
        for table in self.tables.values_mut() {
            any_change |= table.eliminate_non_changed_fields();
            any_change |= table.eliminate_unchanged_records();
        }
        let tables_removed = self.eliminate_unchanged_tables();
        if any_change || tables_removed {
            tracing::trace!(remaining_tables = self.tables.len(), "change-set pruned");
        }
        any_change || tables_removed
    }
}
