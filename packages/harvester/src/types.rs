//! Core data types for the harvester.
//!
//! A [`FieldTable`] is the common contract between the two ingestion paths
//! (TSV rows and search result items). The normalizer turns it into a
//! [`CanonicalRecord`], which holds only schema-legal values.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Separator between values inside a single TSV cell.
pub const MULTI_VALUE_SEPARATOR: char = '|';

/// A raw field value as it arrives from a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Single string, possibly `|`-joined (TSV path).
    Text(String),

    /// Native list (search API path).
    List(Vec<String>),
}

impl FieldValue {
    /// True when the value carries no non-whitespace content.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.iter().all(|s| s.trim().is_empty()),
        }
    }

    /// Split into trimmed, non-empty parts.
    ///
    /// Text values are split on `|`; list entries are taken as they are.
    #[must_use]
    pub fn values(&self) -> Vec<String> {
        let parts: Vec<&str> = match self {
            Self::Text(s) => s.split(MULTI_VALUE_SEPARATOR).collect(),
            Self::List(items) => items.iter().map(String::as_str).collect(),
        };
        parts
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// Render as a single string.
    ///
    /// Lists are joined with ` | `, the same form the TSV export writes, so
    /// both ingestion paths see identical text.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(" | "),
        }
    }

    /// The value used where the schema allows only one.
    ///
    /// Text values are returned whole and trimmed; lists contribute their
    /// first non-blank entry.
    #[must_use]
    pub fn single(&self) -> String {
        match self {
            Self::Text(s) => s.trim().to_string(),
            Self::List(items) => items
                .iter()
                .map(|s| s.trim())
                .find(|s| !s.is_empty())
                .unwrap_or_default()
                .to_string(),
        }
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

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Flat mapping of field names to raw values for one source record.
///
/// Keeps insertion order so a table written back to TSV keeps its columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldTable {
    fields: IndexMap<String, FieldValue>,
}

impl FieldTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Raw value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Raw value for a key, treating blank values as absent.
    #[must_use]
    pub fn non_blank(&self, key: &str) -> Option<&FieldValue> {
        self.get(key).filter(|v| !v.is_blank())
    }

    /// Whether the key is present (even if blank).
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FieldTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (k, v) in iter {
            table.insert(k, v);
        }
        table
    }
}

/// Resource type, restricted to the values the schema accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordType {
    Manuscript,
    StillImage,
    Codex,
    /// Title-cased source type that matched no rule.
    Other(String),
}

impl RecordType {
    /// Text written to `dc:type`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Manuscript => "Manuscript",
            Self::StillImage => "Still Image",
            Self::Codex => "Codex",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sentinel for dates that cannot be resolved to a year.
pub const UNCERTAIN_DATE: &str = "Uncertain";

/// Value half of a labeled date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateValue {
    Uncertain,
    Year(String),
    Range { min: String, max: String },
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uncertain => f.write_str(UNCERTAIN_DATE),
            Self::Year(year) => f.write_str(year),
            Self::Range { min, max } => write!(f, "{min},{max}"),
        }
    }
}

/// Resolved date of a record.
///
/// "No date supplied" ([`RecordDate::Uncertain`]) and "date text without a
/// parseable year" (`Labeled` with [`DateValue::Uncertain`]) render
/// differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordDate {
    /// Bare four-digit year.
    Year(String),
    /// Bare sentinel; no date text was supplied.
    Uncertain,
    /// Original text kept as label next to the derived value.
    Labeled { label: String, value: DateValue },
}

/// One creator together with its relator role code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorRole {
    /// Relator code, used as the element name in the role namespace.
    pub role: String,
    pub name: String,
}

impl CreatorRole {
    pub fn new(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            name: name.into(),
        }
    }
}

/// Normalized, write-ready record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    pub id: String,
    pub title: String,
    pub archives: Vec<String>,
    pub creators: Vec<CreatorRole>,
    pub source: String,
    pub description: Option<String>,
    pub subjects: Vec<String>,
    pub disciplines: Vec<String>,
    /// Never empty; sorted for reproducible output.
    pub genres: BTreeSet<String>,
    pub freeculture: String,
    pub record_type: RecordType,
    pub date: RecordDate,
    pub language: Option<String>,
    pub see_also: String,
    pub thumbnail: Option<String>,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Records normalized, built and appended.
    pub processed: usize,
    /// Records skipped because their id was already registered.
    pub duplicates: usize,
    /// Records skipped in lenient mode, with the reason.
    pub failed: Vec<(String, String)>,
    /// Output documents written, in order.
    pub written: Vec<PathBuf>,
}

/// Trailing path segment of a record id.
///
/// DPLA ids are URLs (`http://dp.la/api/items/<hash>`); the hash names
/// per-record files and keys the dedup registry.
///
/// # Examples
/// ```
/// use siro_harvester::types::id_basename;
///
/// assert_eq!(id_basename("http://dp.la/api/items/abc123"), "abc123");
/// assert_eq!(id_basename("abc123"), "abc123");
/// ```
#[must_use]
pub fn id_basename(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_values_splits_text() {
        let value = FieldValue::from(" Labor | Strikes |  | Unions ");
        assert_eq!(value.values(), vec!["Labor", "Strikes", "Unions"]);
    }

    #[test]
    fn test_field_value_values_keeps_list_entries() {
        let value = FieldValue::from(vec!["a|b".to_string(), " c ".to_string()]);
        assert_eq!(value.values(), vec!["a|b", "c"]);
    }

    #[test]
    fn test_field_value_blank() {
        assert!(FieldValue::from("   ").is_blank());
        assert!(FieldValue::from(Vec::<String>::new()).is_blank());
        assert!(!FieldValue::from("x").is_blank());
    }

    #[test]
    fn test_field_value_text_joins_lists() {
        let value = FieldValue::from(vec!["English".to_string(), "French".to_string()]);
        assert_eq!(value.text(), "English | French");
    }

    #[test]
    fn test_field_value_single() {
        assert_eq!(FieldValue::from(" text ").single(), "text");
        let list = FieldValue::from(vec![" ".to_string(), "image".to_string()]);
        assert_eq!(list.single(), "image");
    }

    #[test]
    fn test_field_table_preserves_order() {
        let table: FieldTable = [("id", "1"), ("title", "T"), ("date", "1850")]
            .into_iter()
            .collect();
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["id", "title", "date"]);
    }

    #[test]
    fn test_field_table_non_blank() {
        let table = FieldTable::new().with("seeAlso", "  ").with("id", "x");
        assert!(table.contains_key("seeAlso"));
        assert!(table.non_blank("seeAlso").is_none());
        assert!(table.non_blank("id").is_some());
    }

    #[test]
    fn test_field_table_json_shape() {
        let json = r#"{"id":"x","subjects":["a","b"]}"#;
        let table: FieldTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.get("id"), Some(&FieldValue::from("x")));
        assert_eq!(
            table.get("subjects"),
            Some(&FieldValue::List(vec!["a".to_string(), "b".to_string()]))
        );
    }

    #[test]
    fn test_date_value_display() {
        assert_eq!(DateValue::Uncertain.to_string(), "Uncertain");
        assert_eq!(DateValue::Year("1850".into()).to_string(), "1850");
        assert_eq!(
            DateValue::Range {
                min: "1850".into(),
                max: "1855".into()
            }
            .to_string(),
            "1850,1855"
        );
    }

    #[test]
    fn test_record_type_as_str() {
        assert_eq!(RecordType::StillImage.as_str(), "Still Image");
        assert_eq!(RecordType::Other("Sound".into()).to_string(), "Sound");
    }

    #[test]
    fn test_id_basename_trailing_slash_free() {
        assert_eq!(id_basename("a/b/c"), "c");
    }
}
