//! Column values carried by records and change-sets.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One column value.
///
/// Equality is ordinary value equality. `Null` is distinct from every other
/// value and has no canonical string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Guid(Uuid),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Canonical string form used for key identity.
    ///
    /// Byte arrays render as `0x`-prefixed lowercase hex so they never
    /// collide with the decimal form of an integer. Returns `None` for
    /// `Null`.
    pub fn canonical_string(&self) -> Option<String> {
        let rendered = match self {
            Self::Null => return None,
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            // -0.0 == 0.0, so both render as "0".
            Self::Float(value) if *value == 0.0 => 0.0_f64.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Text(value) => value.clone(),
            Self::Bytes(bytes) => hex_string(bytes),
            Self::Timestamp(value) => value.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Self::Guid(value) => value.hyphenated().to_string(),
        };
        Some(rendered)
    }
}

fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.canonical_string() {
            Some(rendered) => write!(f, "{rendered}"),
            None => write!(f, "NULL"),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for FieldValue {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        Self::Guid(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn bytes_render_as_prefixed_hex() {
        let value = FieldValue::from(vec![0x00, 0xab, 0x10]);
        assert_eq!(value.canonical_string().as_deref(), Some("0x00ab10"));
    }

    #[test]
    fn negative_zero_renders_like_zero() {
        assert_eq!(FieldValue::Float(-0.0).canonical_string().as_deref(), Some("0"));
        assert_eq!(FieldValue::Float(1.5).canonical_string().as_deref(), Some("1.5"));
    }

    #[test]
    fn null_has_no_canonical_form() {
        assert_eq!(FieldValue::Null.canonical_string(), None);
        assert_eq!(FieldValue::from(None::<i64>), FieldValue::Null);
        assert_eq!(FieldValue::Null.to_string(), "NULL");
    }

    #[test]
    fn timestamps_render_as_utc_rfc3339() {
        let at = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 30, 0)
            .single()
            .expect("valid timestamp");
        assert_eq!(
            FieldValue::from(at).canonical_string().as_deref(),
            Some("2024-05-01T12:30:00Z")
        );
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(FieldValue::from(42)).expect("serialize");
        assert_eq!(json, serde_json::json!({ "type": "int", "value": 42 }));
    }
}
