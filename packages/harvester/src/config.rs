//! Configuration constants, run configuration and validation functions.
//!
//! Run settings are read from a YAML file in which every field is optional.
//! The DPLA API key may also come from the environment, and CLI flags
//! override both.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{HarvesterError, Result};
use crate::types::id_basename;

/// Federation name written into every record.
pub const FEDERATION: &str = "SiRO";

/// Constant value of `collex:fulltext`.
pub const FULLTEXT: &str = "TRUE";

/// Default `collex:freeculture` when the source leaves it blank.
pub const DEFAULT_FREECULTURE: &str = "TRUE";

/// Default number of records per output document.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Log a progress line every this many records.
pub const PROGRESS_INTERVAL: usize = 500;

/// Local name of the record element in the `sro` namespace.
pub const DEFAULT_RECORD_ELEMENT: &str = "dpla";

/// Link synthesized when a record has no `seeAlso`; `{id}` is replaced by
/// the trailing segment of the record id.
pub const DEFAULT_SEE_ALSO_TEMPLATE: &str = "http://dp.la/item/{id}";

/// Base URL of the DPLA API.
pub const DPLA_API_URL: &str = "https://api.dp.la/v2";

/// Base URL of the HathiTrust catalog (bibliographic API).
pub const HATHI_CATALOG_URL: &str = "https://catalog.hathitrust.org";

/// Environment variable holding the DPLA API key.
pub const DPLA_API_KEY_ENV: &str = "DPLA_API_KEY";

/// HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default number of items requested per search page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Largest page size the DPLA API accepts.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Pause between consecutive search pages.
pub const DEFAULT_PAGE_DELAY_MS: u64 = 500;

/// Fallback for `dc:type` when no rule matches the raw type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeFallback {
    /// Title-case the raw type (`sound` becomes `Sound`).
    #[default]
    TitleCase,
    /// Always use `Codex`.
    Codex,
}

/// How creator and role lists of different lengths are paired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairingPolicy {
    /// Pair by position and drop the surplus of the longer list.
    #[default]
    Truncate,
    /// Reject the record.
    Strict,
}

/// Values substituted for blank source fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultValues {
    pub archive: Vec<String>,
    pub discipline: Vec<String>,
    pub genre: String,
    pub role: String,
}

impl Default for DefaultValues {
    fn default() -> Self {
        Self {
            archive: vec!["dpla".to_string()],
            discipline: vec!["History".to_string()],
            genre: "Nonfiction".to_string(),
            role: "CRE".to_string(),
        }
    }
}

/// Settings of the field normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub defaults: DefaultValues,
    pub type_fallback: TypeFallback,
    pub pairing: PairingPolicy,
    pub see_also_template: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            defaults: DefaultValues::default(),
            type_fallback: TypeFallback::default(),
            pairing: PairingPolicy::default(),
            see_also_template: DEFAULT_SEE_ALSO_TEMPLATE.to_string(),
        }
    }
}

/// Settings of the document builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Local name of the record element (`sro:<name>`).
    pub record_element: String,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            record_element: DEFAULT_RECORD_ELEMENT.to_string(),
        }
    }
}

/// Where and how output documents are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Batch mode: path of the first document. Per-record mode: directory.
    pub path: PathBuf,
    pub batch_size: usize,
    /// Write one document per record instead of numbered batches.
    pub per_record: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("rdf/records.xml"),
            batch_size: DEFAULT_BATCH_SIZE,
            per_record: false,
        }
    }
}

/// Dedup registry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Track ids across runs. When off, ids are still unique within a run.
    pub enabled: bool,
    pub path: PathBuf,
    /// Start from an empty registry instead of the persisted one.
    pub reset: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("data/processed_ids.json"),
            reset: false,
        }
    }
}

/// DPLA search and HathiTrust lookup settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub page_size: u32,
    pub page_delay_ms: u64,
    /// `|`-separated disciplines assigned to every harvested item.
    pub disciplines: String,
    /// Keep only items whose `isShownAt` contains this text.
    pub id_match: Option<String>,
    /// Look up the MARC literary form of HathiTrust items.
    pub marc_genre: bool,
    pub hathi_base_url: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DPLA_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
            disciplines: String::new(),
            id_match: None,
            marc_genre: false,
            hathi_base_url: HATHI_CATALOG_URL.to_string(),
        }
    }
}

/// Complete run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvesterConfig {
    pub input: Option<PathBuf>,
    /// Process only the first N records.
    pub limit: Option<usize>,
    /// Abort the run on the first record error instead of skipping it.
    pub strict: bool,
    pub output: OutputConfig,
    pub dedup: DedupConfig,
    pub normalizer: NormalizerConfig,
    pub builder: BuilderConfig,
    pub search: SearchConfig,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            input: None,
            limit: None,
            strict: true,
            output: OutputConfig::default(),
            dedup: DedupConfig::default(),
            normalizer: NormalizerConfig::default(),
            builder: BuilderConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl HarvesterConfig {
    /// Parse a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HarvesterError::InputNotFound(path.to_path_buf()));
        }
        let yaml = fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&yaml)?;
        config.apply_env();
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Take the DPLA API key from the environment when the file has none.
    pub fn apply_env(&mut self) {
        if self.search.api_key.is_none() {
            self.search.api_key = std::env::var(DPLA_API_KEY_ENV)
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        validate_batch_size(self.output.batch_size)?;
        validate_page_size(self.search.page_size)?;
        validate_xml_name("builder.record_element", &self.builder.record_element)?;
        validate_xml_name("normalizer.defaults.role", &self.normalizer.defaults.role)?;
        Ok(())
    }
}

/// Unprefixed XML name (NCName), restricted to ASCII.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static XML_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.-]*$").expect("valid regex"));

/// Validate a setting that becomes the local name of an XML element.
///
/// # Examples
/// ```
/// use siro_harvester::config::validate_xml_name;
///
/// assert!(validate_xml_name("builder.record_element", "dpla").is_ok());
/// assert!(validate_xml_name("builder.record_element", "C R E").is_err());
/// ```
pub fn validate_xml_name(field: &str, value: &str) -> Result<()> {
    if !XML_NAME.is_match(value) {
        return Err(HarvesterError::InvalidConfig(format!(
            "{field} must be an XML name without prefix, got '{value}'"
        )));
    }
    Ok(())
}

/// Validate a batch size.
///
/// # Examples
/// ```
/// use siro_harvester::config::validate_batch_size;
///
/// assert!(validate_batch_size(500).is_ok());
/// assert!(validate_batch_size(0).is_err());
/// ```
pub fn validate_batch_size(batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(HarvesterError::InvalidConfig(
            "batch size must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Validate a search page size against the DPLA limit.
pub fn validate_page_size(page_size: u32) -> Result<()> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(HarvesterError::InvalidConfig(format!(
            "page size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
        )));
    }
    Ok(())
}

/// Build the fallback link for a record from the configured template.
///
/// # Examples
/// ```
/// use siro_harvester::config::{see_also_url, DEFAULT_SEE_ALSO_TEMPLATE};
///
/// assert_eq!(
///     see_also_url(DEFAULT_SEE_ALSO_TEMPLATE, "http://dp.la/api/items/abc"),
///     "http://dp.la/item/abc"
/// );
/// ```
pub fn see_also_url(template: &str, id: &str) -> String {
    template.replace("{id}", id_basename(id))
}
