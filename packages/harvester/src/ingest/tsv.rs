//! Tab-separated spreadsheets: the hand-curated input format.

use std::fs;
use std::path::Path;

use crate::batch::write_atomic;
use crate::error::{HarvesterError, Result};
use crate::types::{FieldTable, FieldValue};

const DELIMITER: char = '\t';

/// Read field tables from a TSV file.
///
/// The header row names the fields; each data row is zipped against it.
/// `limit` keeps only the first N data rows.
///
/// # Errors
/// `InputNotFound` when `path` does not exist; nothing is read in that case.
pub fn read_tsv(path: &Path, limit: Option<usize>) -> Result<Vec<FieldTable>> {
    if !path.exists() {
        return Err(HarvesterError::InputNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let tables = parse_tsv(&content, limit);
    tracing::info!(path = %path.display(), records = tables.len(), "Read TSV");
    Ok(tables)
}

/// Parse TSV text into field tables.
///
/// Rows shorter than the header yield tables without the trailing keys;
/// surplus cells are ignored. Blank lines are skipped.
///
/// # Examples
/// ```
/// use siro_harvester::ingest::parse_tsv;
///
/// let tables = parse_tsv("id\ttitle\n1\tFirst\n2\n", None);
/// assert_eq!(tables.len(), 2);
/// assert!(tables[1].get("title").is_none());
/// ```
#[must_use]
pub fn parse_tsv(content: &str, limit: Option<usize>) -> Vec<FieldTable> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines();

    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let headings: Vec<&str> = header_line.split(DELIMITER).map(str::trim).collect();

    lines
        .filter(|line| !line.trim().is_empty())
        .take(limit.unwrap_or(usize::MAX))
        .map(|line| {
            headings
                .iter()
                .zip(line.trim_end_matches(['\r', '\n']).split(DELIMITER))
                .map(|(heading, value)| (*heading, value))
                .collect()
        })
        .collect()
}

/// Write field tables as TSV for hand curation.
///
/// Columns follow the keys of the first table. List values are joined with
/// ` | ` and tabs inside values become spaces.
///
/// # Errors
/// `EmptyExport` when `tables` is empty.
pub fn write_tsv(path: &Path, tables: &[FieldTable]) -> Result<()> {
    let first = tables.first().ok_or(HarvesterError::EmptyExport)?;
    let headings: Vec<&str> = first.keys().collect();

    let mut out = headings.join("\t");
    out.push('\n');
    for table in tables {
        let cells: Vec<String> = headings
            .iter()
            .map(|heading| {
                table
                    .get(heading)
                    .map(FieldValue::text)
                    .unwrap_or_default()
                    .replace(['\t', '\n', '\r'], " ")
            })
            .collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }

    write_atomic(path, out.as_bytes())?;
    tracing::info!(path = %path.display(), records = tables.len(), "Wrote TSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const SAMPLE: &str = "id\ttitle\tsubjects\tdate\r\n\
                          a1\tStrike bulletin\tLabor|Strikes\t1894\r\n\
                          a2\tMinutes\t\tn.d.\r\n\
                          a3\tShort row\r\n";

    #[test]
    fn test_zips_rows_against_header() {
        let tables = parse_tsv(SAMPLE, None);
        assert_eq!(tables.len(), 3);
        assert_eq!(tables[0].get("id"), Some(&FieldValue::from("a1")));
        assert_eq!(
            tables[0].get("subjects"),
            Some(&FieldValue::from("Labor|Strikes"))
        );
        // Trailing line terminator does not leak into the last column
        assert_eq!(tables[0].get("date"), Some(&FieldValue::from("1894")));
        assert_eq!(tables[1].get("subjects"), Some(&FieldValue::from("")));
    }

    #[test]
    fn test_short_row_misses_trailing_keys() {
        let tables = parse_tsv(SAMPLE, None);
        assert_eq!(tables[2].len(), 2);
        assert!(!tables[2].contains_key("subjects"));
        assert!(!tables[2].contains_key("date"));
    }

    #[test]
    fn test_limit() {
        assert_eq!(parse_tsv(SAMPLE, Some(2)).len(), 2);
        assert_eq!(parse_tsv(SAMPLE, Some(0)).len(), 0);
        assert_eq!(parse_tsv(SAMPLE, Some(10)).len(), 3);
    }

    #[test]
    fn test_header_trimmed_and_bom_stripped() {
        let tables = parse_tsv("\u{feff}id \t title\nx\ty\n", None);
        assert_eq!(tables[0].keys().collect::<Vec<_>>(), vec!["id", "title"]);
    }

    #[test]
    fn test_extra_cells_ignored() {
        let tables = parse_tsv("id\nx\textra\n", None);
        assert_eq!(tables[0].len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_tsv("", None).is_empty());
        assert!(parse_tsv("id\ttitle\n", None).is_empty());
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_tsv(Path::new("/nonexistent/input.tsv"), None);
        assert!(matches!(result, Err(HarvesterError::InputNotFound(_))));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("export.tsv");
        let tables = vec![
            FieldTable::new()
                .with("id", "x1")
                .with("title", "Tab\there")
                .with("subjects", vec!["Labor".to_string(), "Strikes".to_string()]),
            FieldTable::new().with("id", "x2"),
        ];
        write_tsv(&path, &tables).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "id\ttitle\tsubjects\nx1\tTab here\tLabor | Strikes\nx2\t\t\n"
        );

        let read = read_tsv(&path, None).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].get("subjects").unwrap().values(), vec!["Labor", "Strikes"]);
    }

    #[test]
    fn test_write_empty_is_error() {
        let dir = tempdir().unwrap();
        let result = write_tsv(&dir.path().join("x.tsv"), &[]);
        assert!(matches!(result, Err(HarvesterError::EmptyExport)));
    }
}
