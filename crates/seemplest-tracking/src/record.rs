//! Runtime record mapping: descriptors, the `Record` trait and `DataRecord`.

use crate::error::TrackingError;
use crate::value::FieldValue;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// One mapped column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    /// Position of this column within the primary key, if it is part of it.
    pub primary_key_order: Option<u32>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key_order: None,
        }
    }

    pub fn primary_key(name: impl Into<String>, order: u32) -> Self {
        Self {
            name: name.into(),
            primary_key_order: Some(order),
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key_order.is_some()
    }
}

/// Table name plus the ordered list of mapped columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDescriptor {
    table_name: String,
    fields: Vec<FieldDescriptor>,
}

impl RecordDescriptor {
    pub fn new(table_name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            table_name: table_name.into(),
            fields,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Primary-key columns in key order.
    ///
    /// Columns sharing an ordinal keep their declaration order.
    pub fn primary_key_fields(&self) -> Vec<&FieldDescriptor> {
        let mut keys: Vec<&FieldDescriptor> =
            self.fields.iter().filter(|f| f.is_primary_key()).collect();
        keys.sort_by_key(|f| f.primary_key_order);
        keys
    }

    fn unknown_field(&self, name: &str) -> TrackingError {
        TrackingError::UnknownField {
            table: self.table_name.clone(),
            field: name.to_string(),
        }
    }
}

/// A record instance that can be read through its descriptor.
pub trait Record {
    fn descriptor(&self) -> &RecordDescriptor;

    /// Current value of `name`, or `None` when the column was never set.
    fn field_value(&self, name: &str) -> Option<FieldValue>;

    /// Copy of every set column, keyed by name.
    fn snapshot(&self) -> BTreeMap<String, FieldValue> {
        self.descriptor()
            .fields()
            .iter()
            .filter_map(|field| {
                self.field_value(&field.name)
                    .map(|value| (field.name.clone(), value))
            })
            .collect()
    }
}

/// Dynamic record that remembers which columns were assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRecord {
    descriptor: Arc<RecordDescriptor>,
    values: BTreeMap<String, FieldValue>,
    modified: BTreeSet<String>,
}

impl DataRecord {
    pub fn new(descriptor: Arc<RecordDescriptor>) -> Self {
        Self {
            descriptor,
            values: BTreeMap::new(),
            modified: BTreeSet::new(),
        }
    }

    /// Assign a column and mark it modified.
    pub fn set_value(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), TrackingError> {
        if self.descriptor.field(name).is_none() {
            return Err(self.descriptor.unknown_field(name));
        }
        self.values.insert(name.to_string(), value.into());
        self.modified.insert(name.to_string());
        Ok(())
    }

    /// Builder form of [`DataRecord::set_value`].
    pub fn with_value(
        mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<Self, TrackingError> {
        self.set_value(name, value)?;
        Ok(self)
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn is_modified(&self, name: &str) -> bool {
        self.modified.contains(name)
    }

    /// Names of assigned columns, in descriptor order.
    pub fn modified_columns(&self) -> Vec<&str> {
        self.descriptor
            .fields()
            .iter()
            .filter(|field| self.modified.contains(&field.name))
            .map(|field| field.name.as_str())
            .collect()
    }

    /// Forget modification flags, keeping the values.
    pub fn clear_modified(&mut self) {
        self.modified.clear();
    }

    /// Copy every modified column of `other` onto this record.
    ///
    /// Unmodified columns of `other` are ignored, so merging a sparse update
    /// into a loaded record only touches what the update assigned. Every
    /// column is checked against this record's descriptor first; on error
    /// nothing is copied.
    pub fn merge(&mut self, other: &DataRecord) -> Result<(), TrackingError> {
        if let Some(unknown) = other
            .modified
            .iter()
            .find(|name| self.descriptor.field(name).is_none())
        {
            return Err(self.descriptor.unknown_field(unknown));
        }

        for name in &other.modified {
            let value = other.values.get(name).cloned().unwrap_or(FieldValue::Null);
            self.set_value(name, value)?;
        }
        Ok(())
    }
}

impl Record for DataRecord {
    fn descriptor(&self) -> &RecordDescriptor {
        &self.descriptor
    }

    fn field_value(&self, name: &str) -> Option<FieldValue> {
        self.values.get(name).cloned()
    }
}
