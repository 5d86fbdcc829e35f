//! User-supplied field values for one invocation.
//!
//! An [`EditRequest`] maps edit-kind names (`replaceFall`, `pricingRows`, ...)
//! to JSON values exactly as the form sends them. Absent keys, `null`, empty
//! strings and empty lists all mean "leave the document alone" for that pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Mapping from edit-kind name to an optional value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditRequest {
    values: Map<String, Value>,
}

impl EditRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and programmatic callers.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(is_blank)
    }

    /// A scalar value as text, or `None` when absent or blank.
    pub fn text(&self, key: &str) -> Option<String> {
        self.values.get(key).and_then(scalar_text).filter(|s| !s.trim().is_empty())
    }

    /// The row records under `key`, in order. Non-object entries are ignored.
    pub fn rows(&self, key: &str) -> Vec<RowRecord> {
        match self.values.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(RowRecord::from_value).collect(),
            _ => Vec::new(),
        }
    }
}

impl From<Map<String, Value>> for EditRequest {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

/// One row of a tabular region, as named fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowRecord {
    fields: BTreeMap<String, String>,
}

impl RowRecord {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let fields = object
            .iter()
            .filter_map(|(k, v)| scalar_text(v).map(|text| (k.clone(), text)))
            .collect();
        Some(Self { fields })
    }

    /// Field value, empty when absent.
    pub fn get(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }
}

/// One column of a row schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub required: bool,
}

/// Ordered field list that maps a [`RowRecord`] onto table cells.
///
/// Filtering is by required field, not by "any field set": the built-in fee
/// and facility schemas require their naming columns, so a row holding only
/// a bed count is dropped even though it is not blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSchema {
    pub fields: Vec<FieldSpec>,
}

impl RowSchema {
    /// Build a schema from `(name, required)` pairs.
    pub fn new(fields: &[(&str, bool)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(name, required)| FieldSpec {
                    name: name.to_string(),
                    required: *required,
                })
                .collect(),
        }
    }

    /// A row is valid when every required field is non-empty.
    pub fn is_valid(&self, row: &RowRecord) -> bool {
        self.fields
            .iter()
            .filter(|f| f.required)
            .all(|f| !row.get(&f.name).trim().is_empty())
    }

    /// Drop invalid rows and project the rest onto the schema's field order.
    pub fn project(&self, rows: &[RowRecord]) -> Vec<Vec<String>> {
        rows.iter()
            .filter(|row| self.is_valid(row))
            .map(|row| self.fields.iter().map(|f| row.get(&f.name).to_string()).collect())
            .collect()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_values_are_absent() {
        let edits: EditRequest = serde_json::from_value(json!({
            "replaceFall": "",
            "homeLegalName": null,
            "pricingRows": [],
        }))
        .unwrap();
        assert!(edits.is_empty());
        assert_eq!(edits.text("replaceFall"), None);
        assert_eq!(edits.text("homeLegalName"), None);
        assert!(edits.rows("pricingRows").is_empty());
    }

    #[test]
    fn test_numbers_become_text() {
        let edits: EditRequest = serde_json::from_value(json!({
            "facilityRows": [{ "facilityName": "Sunrise", "bedCount": 120 }],
        }))
        .unwrap();
        let rows = edits.rows("facilityRows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("bedCount"), "120");
        assert_eq!(rows[0].get("group"), "");
    }

    #[test]
    fn test_schema_filters_invalid_rows() {
        let schema = RowSchema::new(&[("description", true), ("fee", true)]);
        let rows = vec![
            RowRecord::from_pairs([("description", "0-750"), ("fee", "$0.10")]),
            RowRecord::from_pairs([("description", "751-1500"), ("fee", "")]),
            RowRecord::from_pairs([("description", "  "), ("fee", "$0.05")]),
            RowRecord::from_pairs([("description", "751-1500"), ("fee", "$0.08")]),
        ];
        let projected = schema.project(&rows);
        assert_eq!(
            projected,
            vec![
                vec!["0-750".to_string(), "$0.10".to_string()],
                vec!["751-1500".to_string(), "$0.08".to_string()],
            ]
        );
    }

    #[test]
    fn test_optional_fields_may_be_empty() {
        let schema = RowSchema::new(&[("facilityName", true), ("group", false)]);
        let row = RowRecord::from_pairs([("facilityName", "Maple House")]);
        assert!(schema.is_valid(&row));
        assert_eq!(schema.project(&[row]), vec![vec!["Maple House".to_string(), String::new()]]);
    }
}
