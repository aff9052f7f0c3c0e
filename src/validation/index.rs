use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::storage::Document;

/// Where a requirement lives and which version it currently declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// The declared version, if any.
    pub version: Option<u64>,
    /// The document declaring the id.
    pub path: PathBuf,
}

/// A read-only map from requirement id to its current version.
///
/// Built once per batch run, before any document is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionIndex {
    entries: BTreeMap<String, IndexEntry>,
}

impl VersionIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes every document with a metadata id.
    ///
    /// When two documents declare the same id, the first one wins.
    pub fn from_documents<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Self {
        let mut index = Self::new();
        for document in documents {
            let Some(metadata) = document.metadata() else {
                continue;
            };
            let Some(id) = metadata.id() else {
                continue;
            };
            index.insert(id, metadata.version(), document.path());
        }
        index
    }

    /// Records a requirement. Returns `false` (and keeps the existing entry)
    /// if the id was already indexed.
    pub fn insert(&mut self, id: impl Into<String>, version: Option<u64>, path: &Path) -> bool {
        let id = id.into();
        if let Some(existing) = self.entries.get(&id) {
            tracing::warn!(
                "duplicate requirement id {id} in {} (already declared in {})",
                path.display(),
                existing.path.display()
            );
            return false;
        }
        self.entries.insert(
            id,
            IndexEntry {
                version,
                path: path.to_path_buf(),
            },
        );
        true
    }

    /// Looks up a requirement by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&IndexEntry> {
        self.entries.get(id)
    }

    /// The number of indexed requirements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
