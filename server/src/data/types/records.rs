//! Record payload types
//!
//! Records are free-form field maps. Every field holds a scalar
//! [`FieldValue`]; nested objects and arrays are rejected at ingestion.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Scalar value stored in a record field
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

/// Field name to value, in the order the fields were supplied
pub type RecordData = IndexMap<String, FieldValue>;

impl FieldValue {
    /// Build a number, keeping integral values integral
    pub fn from_f64(n: f64) -> Self {
        const MAX_SAFE: f64 = 9_007_199_254_740_992.0;
        if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE {
            return Self::Number(serde_json::Number::from(n as i64));
        }
        serde_json::Number::from_f64(n)
            .map(Self::Number)
            .unwrap_or(Self::Null)
    }

    /// Look up a field, treating a missing field as null
    pub fn field(data: &RecordData, name: &str) -> Self {
        data.get(name).cloned().unwrap_or_default()
    }

    /// Strict numeric view: only numbers are numeric
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Lenient numeric coercion
    ///
    /// Numbers pass through, numeric strings are parsed, booleans map to 1/0.
    /// Anything else is 0.
    pub fn as_number(&self) -> f64 {
        match self {
            Self::Number(n) => n.as_f64().unwrap_or(0.0),
            Self::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .unwrap_or(0.0),
            Self::Bool(true) => 1.0,
            Self::Bool(false) | Self::Null => 0.0,
        }
    }

    /// Display label; null renders as the empty string
    pub fn as_label(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::String(s) => s.clone(),
            Self::Number(n) => format_number(n),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

fn format_number(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_label())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(Self::Number)
            .unwrap_or(Self::Null)
    }
}

/// Record as stored, in insertion order (`seq`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub seq: i64,
    pub id: String,
    pub data_source: String,
    pub data: RecordData,
    pub created_at: i64,
}

/// Collect the field names of `data` not already in `columns`, preserving order
pub fn merge_columns(columns: &mut Vec<String>, data: &RecordData) -> bool {
    let mut changed = false;
    for key in data.keys() {
        if !columns.iter().any(|c| c == key) {
            columns.push(key.clone());
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(json: &str) -> RecordData {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_deserialize_scalars() {
        let d = data(r#"{"s": "x", "i": 5, "f": 2.5, "b": true, "n": null}"#);
        assert_eq!(d["s"], FieldValue::from("x"));
        assert_eq!(d["i"], FieldValue::from(5));
        assert_eq!(d["f"], FieldValue::from(2.5));
        assert_eq!(d["b"], FieldValue::Bool(true));
        assert!(d["n"].is_null());
        assert_eq!(
            d.keys().collect::<Vec<_>>(),
            vec!["s", "i", "f", "b", "n"]
        );
    }

    #[test]
    fn test_deserialize_rejects_nested() {
        assert!(serde_json::from_str::<RecordData>(r#"{"o": {"a": 1}}"#).is_err());
        assert!(serde_json::from_str::<RecordData>(r#"{"a": [1, 2]}"#).is_err());
    }

    #[test]
    fn test_serialize_keeps_integers() {
        let d = data(r#"{"count": 5, "ratio": 0.5}"#);
        assert_eq!(
            serde_json::to_string(&d).unwrap(),
            r#"{"count":5,"ratio":0.5}"#
        );
    }

    #[test]
    fn test_numeric_is_strict() {
        assert_eq!(FieldValue::from(3).numeric(), Some(3.0));
        assert_eq!(FieldValue::from("3").numeric(), None);
        assert_eq!(FieldValue::Bool(true).numeric(), None);
        assert_eq!(FieldValue::Null.numeric(), None);
    }

    #[test]
    fn test_as_number_is_lenient() {
        assert_eq!(FieldValue::from(3).as_number(), 3.0);
        assert_eq!(FieldValue::from(" 4.5 ").as_number(), 4.5);
        assert_eq!(FieldValue::from("abc").as_number(), 0.0);
        assert_eq!(FieldValue::from("NaN").as_number(), 0.0);
        assert_eq!(FieldValue::from("inf").as_number(), 0.0);
        assert_eq!(FieldValue::Bool(true).as_number(), 1.0);
        assert_eq!(FieldValue::Null.as_number(), 0.0);
    }

    #[test]
    fn test_as_label() {
        assert_eq!(FieldValue::from("A").as_label(), "A");
        assert_eq!(FieldValue::from(7).as_label(), "7");
        assert_eq!(FieldValue::from(7.0).as_label(), "7");
        assert_eq!(FieldValue::from(7.25).as_label(), "7.25");
        assert_eq!(FieldValue::Bool(false).as_label(), "false");
        assert_eq!(FieldValue::Null.as_label(), "");
    }

    #[test]
    fn test_from_f64_integral() {
        assert_eq!(FieldValue::from_f64(7.0), FieldValue::from(7));
        assert_eq!(FieldValue::from_f64(2.5), FieldValue::from(2.5));
        assert!(FieldValue::from_f64(f64::NAN).is_null());
    }

    #[test]
    fn test_field_missing_is_null() {
        let d = data(r#"{"a": 1}"#);
        assert_eq!(FieldValue::field(&d, "a"), FieldValue::from(1));
        assert!(FieldValue::field(&d, "b").is_null());
    }

    #[test]
    fn test_merge_columns() {
        let mut columns = vec!["a".to_string()];
        assert!(merge_columns(&mut columns, &data(r#"{"b": 1, "a": 2, "c": 3}"#)));
        assert_eq!(columns, vec!["a", "b", "c"]);
        assert!(!merge_columns(&mut columns, &data(r#"{"c": 1}"#)));
    }
}
