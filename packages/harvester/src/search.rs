//! DPLA search client.
//!
//! Fetches every page of a query from the `/items` endpoint and returns the
//! raw item documents. Mapping them onto field tables is done by
//! [`crate::ingest::item_to_field_table`].

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use crate::config::{validate_page_size, SearchConfig};
use crate::error::{HarvesterError, Result};
use crate::http::{create_client, download_json};

/// What to search for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Free text, sent as `q`.
    Text(String),
    /// Field searches such as `sourceResource.title=masses`.
    Fields(Vec<(String, String)>),
}

impl SearchQuery {
    /// Human readable form, recorded as `original_query` on every item.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Fields(fields) => fields
                .iter()
                .map(|(field, value)| format!("{field}={value}"))
                .collect::<Vec<_>>()
                .join("&"),
        }
    }

    /// Query string pairs for this search.
    fn params(&self) -> Vec<(String, String)> {
        match self {
            Self::Text(text) => vec![("q".to_string(), clean_text_query(text))],
            Self::Fields(fields) => fields.clone(),
        }
    }
}

/// Commas and parentheses break DPLA's free text parser.
fn clean_text_query(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, ',' | '(' | ')'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Items returned by a search.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    /// Total number of hits reported by the API.
    pub count: u64,
    /// Number of pages fetched.
    pub pages: u64,
    pub docs: Vec<Value>,
}

/// Blocking DPLA API client.
pub struct SearchClient {
    client: Client,
    base_url: String,
    api_key: String,
    page_size: u32,
    page_delay: Duration,
}

impl SearchClient {
    /// Create a client from search settings.
    ///
    /// # Errors
    /// `InvalidConfig` when no API key is configured or the page size is out
    /// of range.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                HarvesterError::InvalidConfig(
                    "DPLA API key is not set (search.api_key or DPLA_API_KEY)".to_string(),
                )
            })?;
        validate_page_size(config.page_size)?;

        Ok(Self {
            client: create_client()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            page_size: config.page_size,
            page_delay: Duration::from_millis(config.page_delay_ms),
        })
    }

    /// Run a search and collect the documents of every page.
    ///
    /// The first page reports `count` and `limit`; `ceil(count / limit)`
    /// pages are fetched in total, sleeping the page delay after each one.
    pub fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        let first = self.fetch_page(query, 1)?;
        let count = first.get("count").and_then(Value::as_u64).unwrap_or(0);
        let limit = first
            .get("limit")
            .and_then(Value::as_u64)
            .filter(|l| *l > 0)
            .unwrap_or(u64::from(self.page_size));
        let pages = count.div_ceil(limit).max(1);

        tracing::info!(query = %query.describe(), count, pages, "Search started");

        let mut results = SearchResults {
            count,
            pages,
            docs: docs(&first),
        };
        thread::sleep(self.page_delay);

        for page in 2..=pages {
            let page_number = u32::try_from(page).map_err(|_| {
                HarvesterError::InvalidConfig(format!("page number {page} out of range"))
            })?;
            let body = self.fetch_page(query, page_number)?;
            let page_docs = docs(&body);
            tracing::debug!(page, docs = page_docs.len(), "Fetched page");
            results.docs.extend(page_docs);
            thread::sleep(self.page_delay);
        }

        Ok(results)
    }

    fn fetch_page(&self, query: &SearchQuery, page: u32) -> Result<Value> {
        let url = format!("{}/items", self.base_url);
        let page_size = self.page_size.to_string();
        let page_number = page.to_string();
        let extra = query.params();

        let mut params: Vec<(&str, &str)> = vec![
            ("api_key", self.api_key.as_str()),
            ("page_size", page_size.as_str()),
            ("page", page_number.as_str()),
        ];
        params.extend(extra.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        download_json(&self.client, &url, &params).map_err(|source| {
            HarvesterError::SearchRequest {
                query: query.describe(),
                page,
                source: Box::new(source),
            }
        })
    }
}

fn docs(body: &Value) -> Vec<Value> {
    body.get("docs")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Keep the items whose `isShownAt` contains `pattern`.
#[must_use]
pub fn filter_by_shown_at(docs: Vec<Value>, pattern: &str) -> Vec<Value> {
    docs.into_iter()
        .filter(|doc| {
            doc.get("isShownAt")
                .and_then(Value::as_str)
                .is_some_and(|url| url.contains(pattern))
        })
        .collect()
}
