//! Field normalization: turn a raw [`FieldTable`] into a [`CanonicalRecord`].
//!
//! Every rule here is a pure function of the table and the
//! [`NormalizerConfig`]; no state is carried from one record to the next.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{see_also_url, NormalizerConfig, PairingPolicy, TypeFallback, DEFAULT_FREECULTURE};
use crate::error::{HarvesterError, Result};
use crate::types::{
    id_basename, CanonicalRecord, CreatorRole, DateValue, FieldTable, FieldValue, RecordDate,
    RecordType, MULTI_VALUE_SEPARATOR,
};

/// Genre literal that clears the genre list before heuristics run.
pub const NO_GENRE: &str = "none";

/// Genre added to titles marked as letters.
pub const CORRESPONDENCE: &str = "Correspondence";

/// Creator name used when a record has none.
pub const UNKNOWN_CREATOR: &str = "Unknown";

/// Bracketed note containing "letter", e.g. `[Letter]`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LETTER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[.*letter.*\]").expect("valid regex"));

/// Bracketed note containing "manuscript", e.g. `[manuscript]`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static MANUSCRIPT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[.*manuscript.*\]").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static YEAR_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}$").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static YEAR_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]{4}").expect("valid regex"));

/// Normalize one field table.
///
/// `id` and `title` are required; every other field falls back to a default
/// when missing or blank.
///
/// # Errors
/// * `MissingField` when `id` or `title` is missing or blank
/// * `InvalidId` when the id ends in `/`
/// * `RoleMismatch` when creator and role counts differ under
///   [`PairingPolicy::Strict`]
pub fn normalize(table: &FieldTable, config: &NormalizerConfig) -> Result<CanonicalRecord> {
    let id = required(table, "id", None)?;
    if id_basename(&id).is_empty() {
        return Err(HarvesterError::InvalidId {
            id,
            reason: "last path segment is empty".to_string(),
        });
    }
    let title = required(table, "title", Some(&id))?;
    let defaults = &config.defaults;

    let raw_type = table.get("type").map(FieldValue::single).unwrap_or_default();
    let raw_date = table.get("date").map(FieldValue::text).unwrap_or_default();

    Ok(CanonicalRecord {
        archives: list_or_default(table, "archive", &defaults.archive),
        creators: resolve_creators(table, &id, config)?,
        source: table
            .get("source")
            .map(|v| v.text().trim().to_string())
            .unwrap_or_default(),
        description: resolve_description(table),
        subjects: list_or_default(table, "subjects", &[]),
        disciplines: list_or_default(table, "discipline", &defaults.discipline),
        genres: resolve_genres(table.get("genre"), &title, &defaults.genre),
        freeculture: table
            .non_blank("freeculture")
            .map(FieldValue::single)
            .unwrap_or_else(|| DEFAULT_FREECULTURE.to_string()),
        record_type: resolve_type(&raw_type, &title, config.type_fallback),
        date: resolve_date(&raw_date),
        language: table
            .non_blank("language")
            .map(|v| v.text().trim().to_string()),
        see_also: resolve_see_also(table, &id, &config.see_also_template),
        thumbnail: table.non_blank("thumbnail").map(FieldValue::single),
        title,
        id,
    })
}

fn required(table: &FieldTable, field: &str, record: Option<&str>) -> Result<String> {
    table
        .non_blank(field)
        .map(FieldValue::single)
        .ok_or_else(|| HarvesterError::MissingField {
            record: record.unwrap_or("<unknown>").to_string(),
            field: field.to_string(),
        })
}

/// Split a list field, substituting `default` when it is missing or blank.
fn list_or_default(table: &FieldTable, field: &str, default: &[String]) -> Vec<String> {
    match table.non_blank(field) {
        Some(value) => value.values(),
        None => default.to_vec(),
    }
}

/// Title-case a string the way catalogers expect: first letter of every
/// word upper case, the rest lower case.
///
/// # Examples
/// ```
/// use siro_harvester::normalize::title_case;
///
/// assert_eq!(title_case("still image"), "Still Image");
/// assert_eq!(title_case("POETRY"), "Poetry");
/// ```
#[must_use]
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_word = false;
    for c in value.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// True when the title carries a bracketed "letter" note.
#[must_use]
pub fn is_letter(title: &str) -> bool {
    LETTER_PATTERN.is_match(title)
}

/// Resolve the genre set.
///
/// `none` starts from an empty set, anything else is split and title-cased.
/// Letters gain `Correspondence`; an empty result falls back to `default`.
pub fn resolve_genres(raw: Option<&FieldValue>, title: &str, default: &str) -> BTreeSet<String> {
    let mut genres: BTreeSet<String> = match raw {
        Some(value) if value.text().trim() == NO_GENRE => BTreeSet::new(),
        Some(value) => value.values().iter().map(|g| title_case(g)).collect(),
        None => BTreeSet::new(),
    };

    if is_letter(title) {
        genres.insert(CORRESPONDENCE.to_string());
    }

    if genres.is_empty() {
        genres.insert(default.to_string());
    }

    genres
}

/// Resolve `dc:type`; the first matching rule wins.
pub fn resolve_type(raw_type: &str, title: &str, fallback: TypeFallback) -> RecordType {
    let raw_type = raw_type.trim();

    if MANUSCRIPT_PATTERN.is_match(title) {
        RecordType::Manuscript
    } else if raw_type == "image" {
        RecordType::StillImage
    } else if raw_type == "text" && is_letter(title) {
        RecordType::Manuscript
    } else if raw_type == "text" || raw_type.is_empty() {
        RecordType::Codex
    } else {
        match fallback {
            TypeFallback::TitleCase => RecordType::Other(title_case(raw_type)),
            TypeFallback::Codex => RecordType::Codex,
        }
    }
}

/// Resolve a free-text date.
///
/// Only the first `|`-separated alternative is considered.
///
/// # Examples
/// ```
/// use siro_harvester::normalize::resolve_date;
/// use siro_harvester::types::{DateValue, RecordDate};
///
/// assert_eq!(resolve_date("1850"), RecordDate::Year("1850".into()));
/// assert_eq!(resolve_date(""), RecordDate::Uncertain);
/// assert_eq!(
///     resolve_date("n.d."),
///     RecordDate::Labeled { label: "n.d.".into(), value: DateValue::Uncertain }
/// );
/// ```
pub fn resolve_date(raw: &str) -> RecordDate {
    let date = raw
        .split(MULTI_VALUE_SEPARATOR)
        .next()
        .unwrap_or_default()
        .trim();

    if date.is_empty() {
        return RecordDate::Uncertain;
    }

    if YEAR_ONLY.is_match(date) {
        return RecordDate::Year(date.to_string());
    }

    let years: Vec<&str> = YEAR_RUN.find_iter(date).map(|m| m.as_str()).collect();
    let value = match (years.iter().min(), years.iter().max()) {
        (Some(min), Some(max)) if min == max => DateValue::Year((*min).to_string()),
        (Some(min), Some(max)) => DateValue::Range {
            min: (*min).to_string(),
            max: (*max).to_string(),
        },
        _ => DateValue::Uncertain,
    };

    RecordDate::Labeled {
        label: date.to_string(),
        value,
    }
}

/// Pair creators with relator roles.
///
/// Parallel `creator`/`role` fields win over a combined `creators` field.
pub fn resolve_creators(
    table: &FieldTable,
    record: &str,
    config: &NormalizerConfig,
) -> Result<Vec<CreatorRole>> {
    let default_role = &config.defaults.role;

    if !table.contains_key("creator") {
        if let Some(combined) = table.non_blank("creators") {
            return Ok(split_combined_creators(combined, default_role));
        }
    }

    let names = match table.non_blank("creator") {
        Some(value) => value.values(),
        None => vec![UNKNOWN_CREATOR.to_string()],
    };

    let roles = match table.non_blank("role") {
        Some(value) => value.values(),
        None => vec![default_role.clone(); names.len()],
    };

    if roles.len() != names.len() {
        match config.pairing {
            PairingPolicy::Strict => {
                return Err(HarvesterError::RoleMismatch {
                    record: record.to_string(),
                    creators: names.len(),
                    roles: roles.len(),
                });
            }
            PairingPolicy::Truncate => {
                tracing::debug!(
                    record,
                    creators = names.len(),
                    roles = roles.len(),
                    "Creator and role counts differ, truncating"
                );
            }
        }
    }

    Ok(roles
        .iter()
        .zip(names)
        .map(|(role, name)| CreatorRole::new(role_code(role, default_role), name))
        .collect())
}

/// Reduce a relator code to characters valid in an XML element name.
///
/// Codes that end up empty or do not start with a letter are replaced by
/// `default_role`.
///
/// # Examples
/// ```
/// use siro_harvester::normalize::role_code;
///
/// assert_eq!(role_code("AUT", "CRE"), "AUT");
/// assert_eq!(role_code("a u t", "CRE"), "aut");
/// assert_eq!(role_code("1st", "CRE"), "CRE");
/// ```
#[must_use]
pub fn role_code(raw: &str, default_role: &str) -> String {
    let code: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_' || *c == '.')
        .collect();
    match code.chars().next() {
        Some(first) if first.is_ascii_alphabetic() => code,
        _ => default_role.to_string(),
    }
}

/// Split `name:ROLE|name:ROLE` entries on the first colon.
fn split_combined_creators(value: &FieldValue, default_role: &str) -> Vec<CreatorRole> {
    let pairs: Vec<CreatorRole> = value
        .values()
        .iter()
        .filter_map(|entry| {
            let (name, role) = match entry.split_once(':') {
                Some((name, role)) => (name.trim(), role.trim()),
                None => (entry.trim(), ""),
            };
            if name.is_empty() {
                return None;
            }
            Some(CreatorRole::new(role_code(role, default_role), name))
        })
        .collect();

    if pairs.is_empty() {
        vec![CreatorRole::new(default_role, UNKNOWN_CREATOR)]
    } else {
        pairs
    }
}

fn resolve_see_also(table: &FieldTable, id: &str, template: &str) -> String {
    table
        .non_blank("seeAlso")
        .or_else(|| table.non_blank("see_also"))
        .map(FieldValue::single)
        .unwrap_or_else(|| see_also_url(template, id))
}

/// Join description entries with newlines, each stripped of a trailing colon.
fn resolve_description(table: &FieldTable) -> Option<String> {
    let entries: Vec<String> = table
        .non_blank("description")?
        .values()
        .iter()
        .map(|entry| {
            let entry = entry.trim();
            entry.strip_suffix(':').unwrap_or(entry).trim().to_string()
        })
        .filter(|entry| !entry.is_empty())
        .collect();

    if entries.is_empty() {
        None
    } else {
        Some(entries.join("\n"))
    }
}
