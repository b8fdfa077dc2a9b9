//! Search result items (DPLA JSON) to field tables.

use serde_json::Value;

use crate::config::FEDERATION;
use crate::error::{HarvesterError, Result};
use crate::normalize::NO_GENRE;
use crate::types::FieldTable;

/// Values shared by every item of one harvest.
#[derive(Debug, Clone, Default)]
pub struct ItemContext<'a> {
    /// Query text recorded in `original_query`.
    pub query: &'a str,
    /// `|`-separated disciplines assigned to every item.
    pub disciplines: &'a str,
}

/// Map one DPLA item onto the field table shape the normalizer expects.
///
/// Descriptive fields come from `sourceResource`; links, provider and id
/// from the top level. `genre` is set to `none` so the title heuristics and
/// the default decide it, unless a caller overrides it afterwards.
///
/// # Errors
/// `InvalidItem` when `@id` or `sourceResource` is missing.
pub fn item_to_field_table(item: &Value, context: &ItemContext<'_>) -> Result<FieldTable> {
    let id = item
        .get("@id")
        .and_then(Value::as_str)
        .ok_or_else(|| HarvesterError::InvalidItem("missing '@id'".to_string()))?;
    let resource = item.get("sourceResource").ok_or_else(|| {
        HarvesterError::InvalidItem(format!("item {id} has no 'sourceResource'"))
    })?;

    let mut table = FieldTable::new();
    table.insert("date", resource.get("date").map(display_date).unwrap_or_default());
    table.insert("title", resource.get("title").map(first_string).unwrap_or_default());
    table.insert("subjects", names(resource.get("subject")));
    table.insert(
        "type",
        resource
            .get("type")
            .or_else(|| resource.get("specType"))
            .map(strings)
            .unwrap_or_default(),
    );
    table.insert("creator", resource.get("creator").map(strings).unwrap_or_default());
    table.insert("language", names(resource.get("language")));
    table.insert("thumbnail", string_at(item, "object"));
    table.insert("seeAlso", string_at(item, "isShownAt"));
    table.insert("source", provider(item));
    table.insert("discipline", context.disciplines);
    table.insert("genre", NO_GENRE);
    table.insert("archive", "");
    table.insert("role", "");
    table.insert("federation", FEDERATION);
    table.insert("original_query", context.query);
    table.insert("id", id);
    Ok(table)
}

/// `date` is either a list of date objects or a single object.
fn display_date(date: &Value) -> String {
    match date {
        Value::Array(items) => items
            .first()
            .and_then(|first| {
                ["displayDate", "begin", "end"]
                    .iter()
                    .find_map(|key| first.get(*key))
            })
            .map(first_string)
            .unwrap_or_default(),
        Value::Object(_) => date.get("displayDate").map(first_string).unwrap_or_default(),
        other => first_string(other),
    }
}

/// A string, or the first string of a list.
fn first_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.first().map(first_string).unwrap_or_default(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A string or list of strings as a list. Nulls are dropped.
fn strings(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(first_string)
            .collect(),
        Value::Null => Vec::new(),
        other => vec![first_string(other)],
    }
}

/// The `name` of every object in a list (`subject`, `language`).
fn names(value: Option<&Value>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };
    let entries: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    entries
        .into_iter()
        .filter_map(|entry| entry.get("name"))
        .map(first_string)
        .collect()
}

fn string_at(item: &Value, key: &str) -> String {
    item.get(key).map(first_string).unwrap_or_default()
}

/// `provider.name`, else `dataProvider`, else empty.
fn provider(item: &Value) -> String {
    if let Some(name) = item.get("provider").and_then(|p| p.get("name")) {
        return first_string(name);
    }
    string_at(item, "dataProvider")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldValue;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn context() -> ItemContext<'static> {
        ItemContext {
            query: "radicalism",
            disciplines: "History|Political Science",
        }
    }

    fn sample_item() -> Value {
        json!({
            "@id": "http://dp.la/api/items/7f3c",
            "isShownAt": "https://catalog.hathitrust.org/Record/001234",
            "object": "https://example.org/thumb.jpg",
            "provider": {"name": "HathiTrust"},
            "dataProvider": "University of Michigan",
            "sourceResource": {
                "title": ["The Masses", "Alt title"],
                "date": [{"displayDate": "1911-1917", "begin": "1911", "end": "1917"}],
                "subject": [{"name": "Socialism"}, {"name": "Art"}],
                "creator": ["Eastman, Max", "Dell, Floyd"],
                "language": [{"name": "English"}],
                "type": "text",
                "specType": ["Serial"]
            }
        })
    }

    #[test]
    fn test_maps_descriptive_fields() {
        let table = item_to_field_table(&sample_item(), &context()).unwrap();

        assert_eq!(table.get("id"), Some(&FieldValue::from("http://dp.la/api/items/7f3c")));
        assert_eq!(table.get("title"), Some(&FieldValue::from("The Masses")));
        assert_eq!(table.get("date"), Some(&FieldValue::from("1911-1917")));
        assert_eq!(
            table.get("subjects").unwrap().values(),
            vec!["Socialism", "Art"]
        );
        assert_eq!(
            table.get("creator").unwrap().values(),
            vec!["Eastman, Max", "Dell, Floyd"]
        );
        assert_eq!(table.get("language").unwrap().text(), "English");
        assert_eq!(table.get("type").unwrap().single(), "text");
        assert_eq!(table.get("source"), Some(&FieldValue::from("HathiTrust")));
        assert_eq!(
            table.get("seeAlso"),
            Some(&FieldValue::from("https://catalog.hathitrust.org/Record/001234"))
        );
        assert_eq!(
            table.get("thumbnail"),
            Some(&FieldValue::from("https://example.org/thumb.jpg"))
        );
    }

    #[test]
    fn test_sets_harvest_constants() {
        let table = item_to_field_table(&sample_item(), &context()).unwrap();
        assert_eq!(table.get("genre"), Some(&FieldValue::from("none")));
        assert_eq!(table.get("archive"), Some(&FieldValue::from("")));
        assert_eq!(table.get("role"), Some(&FieldValue::from("")));
        assert_eq!(table.get("federation"), Some(&FieldValue::from("SiRO")));
        assert_eq!(table.get("original_query"), Some(&FieldValue::from("radicalism")));
        assert_eq!(
            table.get("discipline"),
            Some(&FieldValue::from("History|Political Science"))
        );
    }

    #[test]
    fn test_date_fallbacks() {
        assert_eq!(display_date(&json!([{"begin": "1850"}])), "1850");
        assert_eq!(display_date(&json!([{"end": "1860"}])), "1860");
        assert_eq!(display_date(&json!({"displayDate": "ca. 1900"})), "ca. 1900");
        assert_eq!(display_date(&json!({"displayDate": ["1901", "1902"]})), "1901");
        assert_eq!(display_date(&json!([])), "");
    }

    #[test]
    fn test_spec_type_fallback_and_data_provider() {
        let item = json!({
            "@id": "http://dp.la/api/items/1",
            "dataProvider": "Densho",
            "sourceResource": {"title": "Camp photo", "specType": ["Photograph"]}
        });
        let table = item_to_field_table(&item, &context()).unwrap();
        assert_eq!(table.get("type").unwrap().single(), "Photograph");
        assert_eq!(table.get("source"), Some(&FieldValue::from("Densho")));
        assert!(table.get("subjects").unwrap().is_blank());
        assert!(table.get("creator").unwrap().is_blank());
    }

    #[test]
    fn test_missing_id_or_resource() {
        let no_id = json!({"sourceResource": {"title": "x"}});
        assert!(matches!(
            item_to_field_table(&no_id, &context()),
            Err(HarvesterError::InvalidItem(_))
        ));

        let no_resource = json!({"@id": "http://dp.la/api/items/1"});
        assert!(matches!(
            item_to_field_table(&no_resource, &context()),
            Err(HarvesterError::InvalidItem(_))
        ));
    }
}
