use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use tracing::instrument;
use walkdir::WalkDir;

use crate::{
    domain::Config,
    storage::Document,
    validation::{engine::Engine, index::VersionIndex, report::Report},
};

/// Validates a set of requirement documents in one workspace.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    root: &'a Path,
    config: &'a Config,
}

impl<'a> Batch<'a> {
    /// Creates a batch for the workspace at `root`.
    #[must_use]
    pub const fn new(root: &'a Path, config: &'a Config) -> Self {
        Self { root, config }
    }

    /// Expands the input paths into the list of documents to validate.
    ///
    /// Directories are walked for files with a requirement extension, skipping
    /// hidden directories. Relative inputs are taken relative to the workspace
    /// root. Each document appears once, in order of first mention.
    #[must_use]
    pub fn collect_paths(&self, inputs: &[PathBuf]) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut paths = Vec::new();

        for input in inputs {
            let input: PathBuf = self.root.join(input).components().collect();
            if input.is_dir() {
                let found = WalkDir::new(&input)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()))
                    .filter_map(|entry| match entry {
                        Ok(entry) => Some(entry),
                        Err(e) => {
                            tracing::debug!("skipping unreadable directory entry: {e}");
                            None
                        }
                    })
                    .filter(|entry| entry.file_type().is_file())
                    .map(walkdir::DirEntry::into_path)
                    .filter(|path| self.config.is_requirement_path(path));
                paths.extend(found.filter(|path| seen.insert(path.clone())));
            } else if seen.insert(input.clone()) {
                paths.push(input);
            }
        }

        paths
    }

    /// Validates the documents named by `inputs`.
    ///
    /// All documents are loaded first to build the version index, then each is
    /// validated independently. Reports are returned in input order.
    #[instrument(skip_all, fields(root = %self.root.display()))]
    pub fn run(&self, inputs: &[PathBuf]) -> BatchReport {
        let paths = self.collect_paths(inputs);
        tracing::debug!("validating {} document(s)", paths.len());

        let loaded: Vec<_> = paths
            .par_iter()
            .map(|path| Document::load(path, self.config))
            .collect();

        let index =
            VersionIndex::from_documents(loaded.iter().filter_map(|result| result.as_ref().ok()));
        tracing::debug!("indexed {} requirement id(s)", index.len());

        let engine = Engine::new(self.root, self.config, &index);
        let reports = paths
            .par_iter()
            .zip(loaded.par_iter())
            .map(|(path, loaded)| match loaded {
                Ok(document) => engine.validate_document(document),
                Err(e) => Report::unreadable(path, e),
            })
            .collect();

        BatchReport { reports }
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

/// The reports of every document in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    reports: Vec<Report>,
}

impl BatchReport {
    /// Per-document reports, in input order.
    #[must_use]
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// The number of documents validated.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.reports.len()
    }

    /// The total number of defects across all documents.
    #[must_use]
    pub fn defect_count(&self) -> usize {
        self.reports.iter().map(|r| r.defects().len()).sum()
    }

    /// The total number of warnings across all documents.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.reports.iter().map(|r| r.warnings().len()).sum()
    }

    /// Returns `true` if no document has a defect. Warnings do not count.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.reports.iter().all(Report::is_clean)
    }
}
