//! Error types for the harvester.
//!
//! Uses the dual-error pattern: `HarvesterError` for library consumers
//! with detailed error context, and wrapped source errors for I/O, HTTP and
//! (de)serialization failures.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// Input source does not exist.
    #[error("Invalid path -- file doesn't exist: {}", .0.display())]
    InputNotFound(PathBuf),

    /// A field the normalizer cannot default is missing or blank.
    #[error("Record {record} is missing required field '{field}'")]
    MissingField { record: String, field: String },

    /// Creator and role lists differ in length under the strict pairing policy.
    #[error("Record {record} has {creators} creator(s) but {roles} role(s)")]
    RoleMismatch {
        record: String,
        creators: usize,
        roles: usize,
    },

    /// A record id that cannot name a document or link.
    #[error("Record id '{id}' is invalid: {reason}")]
    InvalidId { id: String, reason: String },

    /// A search result item lacks a key the mapping depends on.
    #[error("Invalid search result item: {0}")]
    InvalidItem(String),

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// TSV export was asked to write no records.
    #[error("Nothing to export: no records were harvested")]
    EmptyExport,

    /// Writing an output document or the dedup store failed.
    #[error("Failed to write {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A search page could not be fetched.
    #[error("Search request for '{query}' failed on page {page}: {source}")]
    SearchRequest {
        query: String,
        page: u32,
        #[source]
        source: Box<HarvesterError>,
    },

    /// All retry attempts exhausted.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// XML serialization failed.
    #[error("XML serialization failed: {0}")]
    XmlWrite(#[from] quick_xml::Error),

    /// Missing required XML element.
    #[error("Missing required XML element: {element} in {context}")]
    MissingElement { element: String, context: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration error.
    #[error("YAML configuration error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl HarvesterError {
    /// Whether the error concerns a single record rather than the whole run.
    ///
    /// Record-level errors may be skipped in lenient mode; everything else
    /// always aborts the run.
    #[must_use]
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::RoleMismatch { .. }
                | Self::InvalidId { .. }
                | Self::InvalidItem(_)
        )
    }
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;
