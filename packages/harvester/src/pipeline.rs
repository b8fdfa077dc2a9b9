//! Pipeline that ties ingestion, normalization, building and writing together.

use std::path::Path;

use serde_json::Value;

use crate::batch::{BatchWriter, DocumentSink, RecordFileWriter};
use crate::config::{HarvesterConfig, PROGRESS_INTERVAL};
use crate::dedup::DedupRegistry;
use crate::error::{HarvesterError, Result};
use crate::hathi::HathiClient;
use crate::ingest::{item_to_field_table, read_tsv, ItemContext};
use crate::normalize::normalize;
use crate::rdf::build_fragment;
use crate::search::{filter_by_shown_at, SearchClient, SearchQuery};
use crate::types::{FieldTable, RunReport};

/// Sequential record pipeline over one dedup registry.
pub struct Pipeline<'a> {
    config: &'a HarvesterConfig,
    registry: DedupRegistry,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a HarvesterConfig, registry: DedupRegistry) -> Self {
        Self { config, registry }
    }

    /// Registry state, including ids marked by [`Pipeline::run`].
    pub fn registry(&self) -> &DedupRegistry {
        &self.registry
    }

    /// Process `tables` in order and write their documents to `sink`.
    ///
    /// Each record is checked against the registry, normalized, built,
    /// appended and marked. Record errors abort the run when
    /// `config.strict` is set and are skipped with a warning otherwise.
    /// When every record has been handled the sink is finished and the
    /// registry persisted.
    ///
    /// # Arguments
    /// * `tables` - Field tables in input order
    /// * `sink` - Destination for built fragments
    ///
    /// # Returns
    /// Counts and written paths of the run
    pub fn run<I>(&mut self, tables: I, sink: &mut dyn DocumentSink) -> Result<RunReport>
    where
        I: IntoIterator<Item = FieldTable>,
    {
        let mut report = RunReport::default();

        for (index, table) in tables.into_iter().enumerate() {
            let label = table
                .non_blank("id")
                .map(|id| id.single())
                .unwrap_or_else(|| format!("#{}", index + 1));

            if (index + 1) % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    records = index + 1,
                    processed = report.processed,
                    duplicates = report.duplicates,
                    "Progress"
                );
            }

            match self.process(&table, &label, sink) {
                Ok(true) => report.processed += 1,
                Ok(false) => {
                    tracing::debug!(id = %label, "Skipping already processed record");
                    report.duplicates += 1;
                }
                Err(e) if e.is_record_error() && !self.config.strict => {
                    tracing::warn!(id = %label, error = %e, "Skipping record");
                    report.failed.push((label, e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        sink.finish()?;
        self.registry.persist()?;
        report.written = sink.written().to_vec();

        tracing::info!(
            processed = report.processed,
            duplicates = report.duplicates,
            failed = report.failed.len(),
            documents = report.written.len(),
            "Run complete"
        );
        Ok(report)
    }

    /// Returns `Ok(false)` for a duplicate.
    fn process(
        &mut self,
        table: &FieldTable,
        label: &str,
        sink: &mut dyn DocumentSink,
    ) -> Result<bool> {
        let id = table
            .non_blank("id")
            .map(|id| id.single())
            .ok_or_else(|| HarvesterError::MissingField {
                record: label.to_string(),
                field: "id".to_string(),
            })?;
        if self.registry.contains(&id) {
            return Ok(false);
        }

        let record = normalize(table, &self.config.normalizer)?;
        let fragment = build_fragment(&record, &self.config.builder);
        sink.append(fragment)?;
        self.registry.mark(&id);
        Ok(true)
    }
}

/// Open the registry described by `config.dedup`.
///
/// With deduplication disabled an in-memory registry is returned, which
/// still keeps ids unique within the run.
pub fn open_registry(config: &HarvesterConfig) -> Result<DedupRegistry> {
    if config.dedup.enabled {
        DedupRegistry::load(&config.dedup.path, config.dedup.reset)
    } else {
        Ok(DedupRegistry::in_memory())
    }
}

/// Output sink for `config.output`.
pub fn make_sink(config: &HarvesterConfig) -> Box<dyn DocumentSink> {
    if config.output.per_record {
        Box::new(RecordFileWriter::new(&config.output.path))
    } else {
        Box::new(BatchWriter::new(&config.output.path, config.output.batch_size))
    }
}

/// Run the pipeline over a set of field tables with the configured
/// registry and sink.
pub fn run_tables(config: &HarvesterConfig, tables: Vec<FieldTable>) -> Result<RunReport> {
    config.validate()?;
    let registry = open_registry(config)?;
    let mut sink = make_sink(config);
    Pipeline::new(config, registry).run(tables, sink.as_mut())
}

/// Build RDF documents from the TSV file at `input`.
pub fn build_from_tsv(config: &HarvesterConfig, input: &Path) -> Result<RunReport> {
    let tables = read_tsv(input, config.limit)?;
    tracing::info!(input = %input.display(), records = tables.len(), "Read TSV");
    run_tables(config, tables)
}

/// Search DPLA and map the result items onto field tables.
///
/// Items are filtered by `search.id_match` and, with `search.marc_genre`,
/// HathiTrust items get their genre from the MARC literary form. A failed
/// genre lookup leaves the genre to the normalizer. With deduplication
/// enabled, items whose id is already registered are dropped.
pub fn harvest(config: &HarvesterConfig, query: &SearchQuery) -> Result<Vec<FieldTable>> {
    let search = &config.search;
    let client = SearchClient::new(search)?;
    let results = client.search(query)?;

    let mut docs = results.docs;
    if let Some(pattern) = search.id_match.as_deref().filter(|p| !p.is_empty()) {
        docs = filter_by_shown_at(docs, pattern);
        tracing::info!(pattern, kept = docs.len(), "Filtered search results");
    }
    if let Some(limit) = config.limit {
        docs.truncate(limit);
    }

    let hathi = if search.marc_genre {
        Some(HathiClient::new(&search.hathi_base_url)?)
    } else {
        None
    };

    let registry = if config.dedup.enabled {
        Some(open_registry(config)?)
    } else {
        None
    };

    let description = query.describe();
    let context = ItemContext {
        query: &description,
        disciplines: &search.disciplines,
    };

    let mut tables = Vec::with_capacity(docs.len());
    let mut skipped = 0;
    for doc in &docs {
        let mut table = match item_to_field_table(doc, &context) {
            Ok(table) => table,
            Err(e) if !config.strict => {
                tracing::warn!(error = %e, "Skipping search result item");
                continue;
            }
            Err(e) => return Err(e),
        };
        if let Some(registry) = &registry {
            if let Some(id) = table.non_blank("id").map(|id| id.single()) {
                if registry.contains(&id) {
                    tracing::debug!(id = %id, "Skipping already processed item");
                    skipped += 1;
                    continue;
                }
            }
        }
        if let Some(hathi) = &hathi {
            apply_marc_genre(hathi, doc, &mut table);
        }
        tables.push(table);
    }
    if skipped > 0 {
        tracing::info!(skipped, kept = tables.len(), "Dropped already processed items");
    }
    Ok(tables)
}

fn apply_marc_genre(hathi: &HathiClient, doc: &Value, table: &mut FieldTable) {
    match hathi.marc_genre(doc) {
        Ok(Some(genre)) => table.insert("genre", genre),
        Ok(None) => {}
        Err(e) => {
            let id = doc.get("@id").and_then(Value::as_str).unwrap_or_default();
            tracing::warn!(id, error = %e, "MARC genre lookup failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::DocumentFragment;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    /// Sink that keeps fragments in memory.
    #[derive(Default)]
    struct MemorySink {
        fragments: Vec<DocumentFragment>,
        finished: bool,
    }

    impl DocumentSink for MemorySink {
        fn append(&mut self, fragment: DocumentFragment) -> Result<()> {
            self.fragments.push(fragment);
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }

        fn written(&self) -> &[PathBuf] {
            &[]
        }
    }

    fn row(id: &str, title: &str) -> FieldTable {
        FieldTable::new().with("id", id).with("title", title)
    }

    #[test]
    fn test_run_emits_in_input_order() {
        let config = HarvesterConfig::default();
        let mut pipeline = Pipeline::new(&config, DedupRegistry::in_memory());
        let mut sink = MemorySink::default();

        let report = pipeline
            .run(vec![row("r1", "First"), row("r2", "Second")], &mut sink)
            .unwrap();

        assert_eq!(report.processed, 2);
        assert!(sink.finished);
        let ids: Vec<_> = sink.fragments.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
    }

    #[test]
    fn test_run_skips_duplicates_within_run() {
        let config = HarvesterConfig::default();
        let mut pipeline = Pipeline::new(&config, DedupRegistry::in_memory());
        let mut sink = MemorySink::default();

        let report = pipeline
            .run(
                vec![row("r1", "First"), row("r1", "Again"), row("r2", "Second")],
                &mut sink,
            )
            .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.duplicates, 1);
        assert_eq!(sink.fragments.len(), 2);
    }

    #[test]
    fn test_run_skips_registered_ids() {
        let config = HarvesterConfig::default();
        let mut registry = DedupRegistry::in_memory();
        registry.mark("http://dp.la/api/items/r1");
        let mut pipeline = Pipeline::new(&config, registry);
        let mut sink = MemorySink::default();

        let report = pipeline
            .run(vec![row("http://dp.la/api/items/r1", "Seen")], &mut sink)
            .unwrap();

        assert_eq!(report.processed, 0);
        assert_eq!(report.duplicates, 1);
        assert!(sink.fragments.is_empty());
    }

    #[test]
    fn test_strict_run_aborts_on_missing_title() {
        let config = HarvesterConfig::default();
        let mut pipeline = Pipeline::new(&config, DedupRegistry::in_memory());
        let mut sink = MemorySink::default();

        let result = pipeline.run(
            vec![row("r1", "First"), FieldTable::new().with("id", "r2")],
            &mut sink,
        );

        assert!(matches!(
            result,
            Err(HarvesterError::MissingField { ref field, .. }) if field == "title"
        ));
        assert_eq!(sink.fragments.len(), 1);
        assert!(!sink.finished);
    }

    #[test]
    fn test_lenient_run_reports_failures() {
        let config = HarvesterConfig {
            strict: false,
            ..HarvesterConfig::default()
        };
        let mut pipeline = Pipeline::new(&config, DedupRegistry::in_memory());
        let mut sink = MemorySink::default();

        let report = pipeline
            .run(
                vec![
                    FieldTable::new().with("title", "No id"),
                    FieldTable::new().with("id", "r2"),
                    row("r3", "Third"),
                ],
                &mut sink,
            )
            .unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].0, "#1");
        assert_eq!(report.failed[1].0, "r2");
        assert!(!pipeline.registry().contains("r2"));
        assert!(pipeline.registry().contains("r3"));
    }

    fn shared_segment_rows() -> Vec<FieldTable> {
        vec![
            row("http://msu.edu/letters/1", "Letter"),
            row("http://msu.edu/photos/1", "Photo"),
            row("http://msu.edu/coll/a/", "Collection A"),
            row("http://msu.edu/coll/b/", "Collection B"),
        ]
    }

    #[test]
    fn test_ids_sharing_last_segment_are_distinct_records() {
        let config = HarvesterConfig {
            strict: false,
            ..HarvesterConfig::default()
        };
        let mut pipeline = Pipeline::new(&config, DedupRegistry::in_memory());
        let mut sink = MemorySink::default();

        let report = pipeline.run(shared_segment_rows(), &mut sink).unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.duplicates, 0);
        let failed: Vec<_> = report.failed.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(failed, vec!["http://msu.edu/coll/a/", "http://msu.edu/coll/b/"]);
        assert_eq!(
            pipeline.registry().ids().collect::<Vec<_>>(),
            vec!["http://msu.edu/letters/1", "http://msu.edu/photos/1"]
        );
    }

    #[test]
    fn test_strict_run_rejects_id_with_trailing_slash() {
        let config = HarvesterConfig::default();
        let mut pipeline = Pipeline::new(&config, DedupRegistry::in_memory());
        let mut sink = MemorySink::default();

        let result = pipeline.run(shared_segment_rows(), &mut sink);

        assert!(matches!(
            result,
            Err(HarvesterError::InvalidId { ref id, .. }) if id == "http://msu.edu/coll/a/"
        ));
        assert_eq!(sink.fragments.len(), 2);
    }

    #[test]
    fn test_per_record_run_keeps_first_of_colliding_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarvesterConfig {
            strict: false,
            ..HarvesterConfig::default()
        };
        let mut pipeline = Pipeline::new(&config, DedupRegistry::in_memory());
        let mut sink = RecordFileWriter::new(dir.path());

        let report = pipeline
            .run(shared_segment_rows().into_iter().take(2), &mut sink)
            .unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "http://msu.edu/photos/1");
        assert!(pipeline.registry().contains("http://msu.edu/letters/1"));
        assert!(!pipeline.registry().contains("http://msu.edu/photos/1"));
    }
}
