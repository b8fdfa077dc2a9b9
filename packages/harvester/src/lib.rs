//! SiRO Harvester - Build ARC/SiRO RDF records from DPLA search results and
//! TSV spreadsheets.
//!
//! Records arrive as field tables (from a TSV file or the DPLA API), are
//! normalized into canonical records, built into `rdf:RDF` fragments and
//! written in batches. A dedup registry keeps records from being emitted
//! twice across runs.
//!
//! # Example
//!
//! ```
//! use siro_harvester::config::NormalizerConfig;
//! use siro_harvester::normalize::normalize;
//! use siro_harvester::types::FieldTable;
//!
//! let table = FieldTable::new()
//!     .with("id", "http://dp.la/api/items/abc")
//!     .with("title", "[Letter to Emma Goldman]");
//! let record = normalize(&table, &NormalizerConfig::default()).unwrap();
//! assert!(record.genres.contains("Correspondence"));
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants, YAML configuration and validation
//! - [`types`]: Field tables and canonical records
//! - [`error`]: Error types and Result alias
//! - [`ingest`]: TSV and DPLA item ingestion, TSV export
//! - [`normalize`]: Field normalization rules
//! - [`rdf`]: Element tree, fragment builder and document serialization
//! - [`batch`]: Batch and per-record document writers
//! - [`dedup`]: Registry of processed ids
//! - [`http`]: HTTP client with retries
//! - [`search`]: DPLA search client
//! - [`hathi`]: HathiTrust MARC genre lookup
//! - [`xml`]: XML reading utilities
//! - [`pipeline`]: Orchestration
//! - [`cli`]: Command-line interface

pub mod batch;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod error;
pub mod hathi;
pub mod http;
pub mod ingest;
pub mod normalize;
pub mod pipeline;
pub mod rdf;
pub mod search;
pub mod types;
pub mod xml;

// Re-export main functions
pub use pipeline::{build_from_tsv, harvest, Pipeline};

// Re-export commonly used items
pub use config::HarvesterConfig;
pub use error::{HarvesterError, Result};
pub use types::{CanonicalRecord, FieldTable, FieldValue, RunReport};
