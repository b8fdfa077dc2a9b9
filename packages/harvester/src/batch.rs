//! Output sinks: numbered batch documents or one document per record.
//!
//! Documents are written through a temp file that is synced and renamed into
//! place, so a crash never leaves a half-written document under its final
//! name.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{HarvesterError, Result};
use crate::rdf::{DocumentFragment, RdfDocument};
use crate::types::id_basename;

/// Destination for built fragments.
pub trait DocumentSink {
    /// Accept one fragment. May write a document.
    fn append(&mut self, fragment: DocumentFragment) -> Result<()>;

    /// Write anything still pending.
    fn finish(&mut self) -> Result<()>;

    /// Documents written so far, in order.
    fn written(&self) -> &[PathBuf];
}

/// Path of the batch with the given index.
///
/// The first batch uses `base` unchanged; later batches append `_<index>` to
/// the file stem.
///
/// # Examples
/// ```
/// use std::path::{Path, PathBuf};
/// use siro_harvester::batch::batch_path;
///
/// assert_eq!(batch_path(Path::new("out/rdf.xml"), 0), PathBuf::from("out/rdf.xml"));
/// assert_eq!(batch_path(Path::new("out/rdf.xml"), 2), PathBuf::from("out/rdf_2.xml"));
/// ```
#[must_use]
pub fn batch_path(base: &Path, index: usize) -> PathBuf {
    if index == 0 {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match base.extension() {
        Some(ext) => format!("{stem}_{index}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{index}"),
    };
    base.with_file_name(file_name)
}

/// Write `content` to `path` via a synced temp file and a rename.
///
/// Parent directories are created. Failures carry the attempted path.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let persist_err = |source: std::io::Error| HarvesterError::Persist {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(persist_err)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_file = path.with_file_name(format!(".{file_name}.tmp"));

    {
        let mut file = File::create(&temp_file).map_err(persist_err)?;
        file.write_all(content).map_err(persist_err)?;
        file.sync_all().map_err(persist_err)?;
    }

    // On Windows, rename fails if the destination already exists
    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path).map_err(persist_err)?;
    }

    fs::rename(&temp_file, path).map_err(persist_err)?;
    Ok(())
}

/// Accumulates fragments and flushes every `batch_size` records.
#[derive(Debug)]
pub struct BatchWriter {
    base_path: PathBuf,
    batch_size: usize,
    root: RdfDocument,
    batches_written: usize,
    written: Vec<PathBuf>,
}

impl BatchWriter {
    /// Create a writer. A `batch_size` of 0 is treated as 1.
    pub fn new(base_path: impl Into<PathBuf>, batch_size: usize) -> Self {
        Self {
            base_path: base_path.into(),
            batch_size: batch_size.max(1),
            root: RdfDocument::new(),
            batches_written: 0,
            written: Vec::new(),
        }
    }

    /// Fragments in the current, unflushed root.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.root.len()
    }

    /// Write the current root and replace it with an empty one.
    ///
    /// Does nothing when the root is empty.
    pub fn flush(&mut self) -> Result<()> {
        if self.root.is_empty() {
            return Ok(());
        }

        let path = batch_path(&self.base_path, self.batches_written);
        let xml = self.root.to_xml()?;
        write_atomic(&path, xml.as_bytes())?;

        tracing::info!(
            path = %path.display(),
            records = self.root.len(),
            "Wrote batch"
        );

        self.root = RdfDocument::new();
        self.batches_written += 1;
        self.written.push(path);
        Ok(())
    }
}

impl DocumentSink for BatchWriter {
    fn append(&mut self, fragment: DocumentFragment) -> Result<()> {
        self.root.append(fragment);
        if self.root.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.flush()
    }

    fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

/// Writes every fragment as its own document named after the id.
///
/// Two ids with the same trailing path segment map to the same file; the
/// second one is rejected rather than overwriting the first.
#[derive(Debug)]
pub struct RecordFileWriter {
    dir: PathBuf,
    written: Vec<PathBuf>,
    owners: HashMap<PathBuf, String>,
}

impl RecordFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
            owners: HashMap::new(),
        }
    }

    /// File a record with this id is written to.
    #[must_use]
    pub fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.xml", id_basename(id)))
    }
}

impl DocumentSink for RecordFileWriter {
    fn append(&mut self, fragment: DocumentFragment) -> Result<()> {
        let path = self.record_path(&fragment.id);
        if let Some(owner) = self.owners.get(&path) {
            return Err(HarvesterError::InvalidId {
                id: fragment.id,
                reason: format!("{} was already written for {owner}", path.display()),
            });
        }

        let id = fragment.id.clone();
        let mut document = RdfDocument::new();
        document.append(fragment);
        write_atomic(&path, document.to_xml()?.as_bytes())?;
        tracing::debug!(path = %path.display(), "Wrote record");
        self.owners.insert(path.clone(), id);
        self.written.push(path);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    fn written(&self) -> &[PathBuf] {
        &self.written
    }
}
