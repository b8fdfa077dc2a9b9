//! Registry of already-emitted record ids.
//!
//! The registry is loaded once per run, marked as records are processed and
//! written back in full at the end of a successful run. Entries are full
//! record ids. A registry rebuilt from a directory of per-record documents
//! also holds bare file stems, which match any id whose trailing path
//! segment equals the stem.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use walkdir::WalkDir;

use crate::batch::write_atomic;
use crate::error::Result;
use crate::types::id_basename;

/// Counts reported by [`DedupRegistry::rebuild_from_dir`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildStats {
    /// Ids added from file names.
    pub added: usize,
    /// File names already present in the registry.
    pub matched: usize,
}

/// Insertion-ordered set of processed ids with an optional backing file.
#[derive(Debug, Clone, Default)]
pub struct DedupRegistry {
    path: Option<PathBuf>,
    ids: IndexSet<String>,
}

impl DedupRegistry {
    /// Registry that lives only for the current run.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the registry stored at `path`.
    ///
    /// With `reset`, the stored contents are ignored and the registry starts
    /// empty. A missing file is treated as an empty registry.
    pub fn load(path: impl Into<PathBuf>, reset: bool) -> Result<Self> {
        let path = path.into();
        let ids = if reset {
            tracing::info!(path = %path.display(), "Resetting dedup registry");
            IndexSet::new()
        } else if path.exists() {
            let json = fs::read_to_string(&path)?;
            serde_json::from_str::<IndexSet<String>>(&json)?
        } else {
            tracing::info!(path = %path.display(), "No dedup registry yet, starting empty");
            IndexSet::new()
        };

        tracing::debug!(path = %path.display(), ids = ids.len(), "Loaded dedup registry");
        Ok(Self {
            path: Some(path),
            ids,
        })
    }

    /// Whether a record with this id was already emitted.
    ///
    /// Besides an exact match, a bare entry equal to the id's trailing path
    /// segment counts as a match.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        if self.ids.contains(id) {
            return true;
        }
        let stem = id_basename(id);
        stem != id && !stem.is_empty() && self.ids.contains(stem)
    }

    /// Record an id as emitted. Returns `false` if it was already present.
    pub fn mark(&mut self, id: &str) -> bool {
        self.ids.insert(id.to_string())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Registered ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Overwrite the backing file with the full current set.
    ///
    /// No-op for an in-memory registry.
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.ids)?;
        write_atomic(path, json.as_bytes())?;
        tracing::info!(path = %path.display(), ids = self.ids.len(), "Persisted dedup registry");
        Ok(())
    }

    /// Add the stem of every `.xml` file below `dir`.
    ///
    /// A stem equal to the trailing path segment of a registered id is
    /// counted as matched and not added. Does not persist; call
    /// [`persist`](Self::persist) afterwards.
    pub fn rebuild_from_dir(&mut self, dir: &Path) -> Result<RebuildStats> {
        let mut stats = RebuildStats::default();
        let mut stems: HashSet<String> =
            self.ids.iter().map(|id| id_basename(id).to_string()).collect();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                std::io::Error::other(format!("cannot walk {}: {e}", dir.display()))
            })?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("xml")
            {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            if stems.contains(stem) {
                stats.matched += 1;
            } else {
                stems.insert(stem.to_string());
                self.ids.insert(stem.to_string());
                stats.added += 1;
            }
        }

        tracing::info!(
            dir = %dir.display(),
            added = stats.added,
            matched = stats.matched,
            "Rebuilt dedup registry from directory"
        );
        Ok(stats)
    }
}
