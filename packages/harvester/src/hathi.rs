//! HathiTrust bibliographic API and the MARC literary form genre lookup.

use reqwest::blocking::Client;
use roxmltree::Document;
use serde_json::Value;

use crate::error::{HarvesterError, Result};
use crate::http::{create_client, download_json};
use crate::xml::{find_child, find_child_with_attribute, get_text, has_tag};

/// Character position of the literary form in the MARC 008 field (books).
const LITERARY_FORM_POSITION: usize = 33;

/// Blocking client for `api/volumes/full/recordnumber/{id}.json`.
pub struct HathiClient {
    client: Client,
    base_url: String,
}

impl HathiClient {
    /// Create a client against `base_url` (normally the public catalog).
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the full bibliographic record for a catalog record number.
    pub fn full_record(&self, record_number: &str) -> Result<Value> {
        let url = format!(
            "{}/api/volumes/full/recordnumber/{record_number}.json",
            self.base_url
        );
        download_json(&self.client, &url, &[])
    }

    /// Fetch a record and return its MARC-XML string.
    pub fn marc_xml(&self, record_number: &str) -> Result<String> {
        let record = self.full_record(record_number)?;
        marc_xml(&record, record_number)
    }

    /// Genre for a search item, looked up through its MARC literary form.
    ///
    /// Returns `None` for items that are not HathiTrust records.
    pub fn marc_genre(&self, item: &Value) -> Result<Option<&'static str>> {
        let Some(record_number) = hathi_record_number(item) else {
            return Ok(None);
        };
        let marc = self.marc_xml(record_number)?;
        Ok(literary_form(&marc)?.and_then(genre_for_literary_form))
    }
}

/// Record number of a DPLA item that points at the HathiTrust catalog.
#[must_use]
pub fn hathi_record_number(item: &Value) -> Option<&str> {
    let shown_at = item.get("isShownAt").and_then(Value::as_str)?;
    if !shown_at.contains("hathitrust") {
        return None;
    }
    item.get("originalRecord")
        .and_then(|record| record.get("_id"))
        .and_then(Value::as_str)
}

/// Extract `records.<id>.marc-xml` from a full record response.
///
/// # Errors
/// `MissingElement` when the record or its MARC-XML is absent.
pub fn marc_xml(record: &Value, record_number: &str) -> Result<String> {
    record
        .get("records")
        .and_then(|records| records.get(record_number))
        .and_then(|entry| entry.get("marc-xml"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| HarvesterError::MissingElement {
            element: "marc-xml".to_string(),
            context: format!("HathiTrust record {record_number}"),
        })
}

/// Literary form character of a MARC-XML record.
///
/// Reads position 33 of `controlfield[@tag='008']`. Returns `None` when the
/// field is missing or too short.
///
/// # Examples
/// ```
/// use siro_harvester::hathi::literary_form;
///
/// let marc = r#"<record><controlfield tag="008">750101s1911    nyu           000 1 eng d</controlfield></record>"#;
/// assert_eq!(literary_form(marc).unwrap(), Some('1'));
/// ```
pub fn literary_form(marc_xml: &str) -> Result<Option<char>> {
    let doc = Document::parse(marc_xml)?;
    let root = doc.root_element();
    let record = if has_tag(root, "record") {
        Some(root)
    } else {
        find_child(root, "record")
    };

    Ok(record
        .and_then(|record| find_child_with_attribute(record, "controlfield", "tag", "008"))
        .and_then(|field| get_text(field).chars().nth(LITERARY_FORM_POSITION)))
}

/// Genre label for a MARC literary form code.
#[must_use]
pub fn genre_for_literary_form(code: char) -> Option<&'static str> {
    match code {
        '0' | 'e' => Some("Nonfiction"),
        '1' | 'f' | 'j' => Some("Fiction"),
        'd' => Some("Drama"),
        'i' => Some("Correspondence"),
        'p' => Some("Poetry"),
        _ => None,
    }
}
