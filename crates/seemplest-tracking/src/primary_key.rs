//! Canonical composite primary keys.

use crate::error::TrackingError;
use crate::record::Record;
use crate::value::FieldValue;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

const COMPONENT_SEPARATOR: char = '|';
const ESCAPE: char = '\\';

/// Ordered key components plus their canonical string.
///
/// Identity (equality, hashing, ordering) is the canonical string alone.
#[derive(Debug, Clone)]
pub struct PrimaryKeyValue {
    components: Vec<FieldValue>,
    key_string: String,
}

impl PrimaryKeyValue {
    /// Build a key from raw components in key order.
    pub fn new(components: Vec<FieldValue>) -> Result<Self, TrackingError> {
        if components.is_empty() {
            return Err(TrackingError::EmptyPrimaryKey);
        }

        let mut key_string = String::new();
        for (index, component) in components.iter().enumerate() {
            let rendered = component
                .canonical_string()
                .ok_or(TrackingError::NullKeyComponent { index })?;
            if index > 0 {
                key_string.push(COMPONENT_SEPARATOR);
            }
            push_escaped(&mut key_string, &rendered);
        }

        Ok(Self {
            components,
            key_string,
        })
    }

    /// Extract the primary-key columns of `record` in key order.
    pub fn from_record(record: &impl Record) -> Result<Self, TrackingError> {
        let descriptor = record.descriptor();
        let key_fields = descriptor.primary_key_fields();
        if key_fields.is_empty() {
            return Err(TrackingError::NoPrimaryKey {
                table: descriptor.table_name().to_string(),
            });
        }

        let mut components = Vec::with_capacity(key_fields.len());
        for field in key_fields {
            match record.field_value(&field.name) {
                Some(value) if !value.is_null() => components.push(value),
                _ => {
                    return Err(TrackingError::MissingKeyField {
                        table: descriptor.table_name().to_string(),
                        field: field.name.clone(),
                    });
                }
            }
        }

        Self::new(components)
    }

    pub fn components(&self) -> &[FieldValue] {
        &self.components
    }

    pub fn key_string(&self) -> &str {
        &self.key_string
    }
}

/// Escape separators and escapes so distinct component lists never join
/// to the same string.
fn push_escaped(out: &mut String, component: &str) {
    for ch in component.chars() {
        if ch == COMPONENT_SEPARATOR || ch == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
}

impl PartialEq for PrimaryKeyValue {
    fn eq(&self, other: &Self) -> bool {
        self.key_string == other.key_string
    }
}

impl Eq for PrimaryKeyValue {}

impl Hash for PrimaryKeyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key_string.hash(state);
    }
}

impl PartialOrd for PrimaryKeyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PrimaryKeyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key_string.cmp(&other.key_string)
    }
}

impl fmt::Display for PrimaryKeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key_string)
    }
}

impl Serialize for PrimaryKeyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{ChangedRecordState, RecordChangeSet};
    use crate::change_set::TableChangeSet;
    use crate::record::{DataRecord, FieldDescriptor, RecordDescriptor};
    use std::collections::hash_map::DefaultHasher;
    use std::sync::Arc;

    fn hash_of(key: &PrimaryKeyValue) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn equal_components_give_equal_keys_and_hashes() {
        let a = PrimaryKeyValue::new(vec![FieldValue::from(1), FieldValue::from("eu")])
            .expect("key should build");
        let b = PrimaryKeyValue::new(vec![FieldValue::from(1), FieldValue::from("eu")])
            .expect("key should build");
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.key_string(), "1|eu");
    }

    #[test]
    fn byte_components_do_not_collide_with_numbers() {
        let bytes = PrimaryKeyValue::new(vec![FieldValue::from(vec![0x12])]).expect("bytes key");
        let number = PrimaryKeyValue::new(vec![FieldValue::from(12)]).expect("int key");
        assert_ne!(bytes, number);
        assert_eq!(bytes.key_string(), "0x12");
    }

    #[test]
    fn separators_inside_text_components_stay_distinct() {
        let left = PrimaryKeyValue::new(vec![FieldValue::from("a|b"), FieldValue::from("c")])
            .expect("key should build");
        let right = PrimaryKeyValue::new(vec![FieldValue::from("a"), FieldValue::from("b|c")])
            .expect("key should build");
        assert_ne!(left, right);
        assert_eq!(left.key_string(), "a\\|b|c");
        assert_eq!(right.key_string(), "a|b\\|c");

        let mut table = TableChangeSet::new("Tag");
        table.insert(left, RecordChangeSet::new(ChangedRecordState::Inserted));
        table.insert(right, RecordChangeSet::new(ChangedRecordState::Inserted));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn escapes_do_not_collide_with_separators() {
        let escaped = PrimaryKeyValue::new(vec![FieldValue::from("a\\"), FieldValue::from("b")])
            .expect("key should build");
        let plain = PrimaryKeyValue::new(vec![FieldValue::from("a\\|b")])
            .expect("key should build");
        assert_ne!(escaped, plain);
    }

    #[test]
    fn signed_zero_floats_share_a_key() {
        let positive = PrimaryKeyValue::new(vec![FieldValue::Float(0.0)]).expect("key");
        let negative = PrimaryKeyValue::new(vec![FieldValue::Float(-0.0)]).expect("key");
        assert_eq!(FieldValue::Float(0.0), FieldValue::Float(-0.0));
        assert_eq!(positive, negative);
        assert_eq!(negative.key_string(), "0");
    }

    #[test]
    fn null_component_is_rejected() {
        let err = PrimaryKeyValue::new(vec![FieldValue::from(1), FieldValue::Null])
            .expect_err("null component must error");
        assert_eq!(err, TrackingError::NullKeyComponent { index: 1 });
        assert_eq!(
            PrimaryKeyValue::new(Vec::new()).expect_err("empty key must error"),
            TrackingError::EmptyPrimaryKey
        );
    }

    #[test]
    fn from_record_uses_declared_key_order() {
        let descriptor = Arc::new(RecordDescriptor::new(
            "Membership",
            vec![
                FieldDescriptor::primary_key("RoleId", 1),
                FieldDescriptor::primary_key("UserId", 0),
                FieldDescriptor::new("Since"),
            ],
        ));
        let record = DataRecord::new(descriptor)
            .with_value("RoleId", 3)
            .and_then(|r| r.with_value("UserId", 42))
            .expect("fields exist");

        let key = PrimaryKeyValue::from_record(&record).expect("key should build");
        assert_eq!(key.key_string(), "42|3");
        assert_eq!(key.components().len(), 2);
    }

    #[test]
    fn from_record_requires_key_values() {
        let descriptor = Arc::new(RecordDescriptor::new(
            "Dive",
            vec![FieldDescriptor::primary_key("Id", 0)],
        ));
        let err = PrimaryKeyValue::from_record(&DataRecord::new(descriptor))
            .expect_err("missing key must error");
        assert!(matches!(err, TrackingError::MissingKeyField { field, .. } if field == "Id"));

        let keyless = Arc::new(RecordDescriptor::new("Log", vec![FieldDescriptor::new("Line")]));
        let err = PrimaryKeyValue::from_record(&DataRecord::new(keyless))
            .expect_err("keyless table must error");
        assert!(matches!(err, TrackingError::NoPrimaryKey { table } if table == "Log"));
    }
}
