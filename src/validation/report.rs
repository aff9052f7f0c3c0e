use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::{
    domain::ReferenceKind, storage::LoadError, validation::resolver::ResolveError,
};

/// A defect found in a requirement document.
///
/// Any defect fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Defect {
    /// A declared reference list is not in ascending order.
    #[error(
        "frontmatter '{kind}' references are not sorted lexicographically\n  Current order: \
         {current_order}\n  Expected order: {expected_order}",
        current_order = format_list(.actual),
        expected_order = format_list(.expected)
    )]
    Unsorted {
        /// The offending reference kind.
        kind: ReferenceKind,
        /// The order as declared.
        actual: Vec<String>,
        /// The sorted order.
        expected: Vec<String>,
    },

    /// A requirement reference entry lacks a required key.
    #[error(
        "requirement reference #{position} missing '{key}' key{context}",
        context = path_context(.path.as_deref())
    )]
    MissingKey {
        /// One-based position of the entry in the list.
        position: usize,
        /// The missing key.
        key: &'static str,
        /// The entry's path, if it has one.
        path: Option<String>,
    },

    /// A requirement reference entry is a plain value rather than a map.
    #[error(
        "requirement reference '{value}' must use map format with 'path' and 'version' \
         keys\n  Example format:\n    - path: {value}\n      version: 1"
    )]
    NotAMap {
        /// The declared value.
        value: String,
    },

    /// A reference is declared in the metadata but never linked from the body.
    #[error("frontmatter declares {noun} '{value}' but it's not used in body", noun = .kind.noun())]
    DeclaredUnused {
        /// The reference kind.
        kind: ReferenceKind,
        /// The declared value.
        value: String,
    },

    /// A reference is linked from the body but not declared in the metadata.
    #[error("body references {noun} '{value}' not declared in frontmatter", noun = .kind.noun())]
    UsedUndeclared {
        /// The reference kind.
        kind: ReferenceKind,
        /// The linked value.
        value: String,
    },

    /// A body reference does not resolve to a matching artifact.
    #[error(transparent)]
    Unresolved(#[from] ResolveError),

    /// The document itself could not be read.
    #[error("{reason}")]
    Unreadable {
        /// Why the document could not be read.
        reason: String,
    },
}

fn format_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|item| format!("'{item}'")).collect();
    format!("[{}]", quoted.join(", "))
}

fn path_context(path: Option<&str>) -> String {
    path.map(|path| format!(" (path: {path})"))
        .unwrap_or_default()
}

/// A problem that is reported but does not fail validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A requirement is referenced at a version other than its current one.
    Stale {
        /// The referenced requirement id.
        id: String,
        /// The path used to reference it.
        path: String,
        /// The version recorded in the reference.
        recorded: u64,
        /// The version the requirement currently declares.
        current: Option<u64>,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stale {
                id,
                path,
                recorded,
                current: Some(current),
            } => write!(
                f,
                "requirement '{id}' ({path}) is referenced at version {recorded} but is now at \
                 version {current}"
            ),
            Self::Stale {
                id,
                path,
                recorded,
                current: None,
            } => write!(
                f,
                "requirement '{id}' ({path}) is referenced at version {recorded} but declares no \
                 version"
            ),
        }
    }
}

/// The outcome of validating a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    path: PathBuf,
    defects: Vec<Defect>,
    warnings: Vec<Warning>,
}

impl Report {
    /// Creates an empty report for a document.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            defects: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Creates a report for a document that could not be read.
    #[must_use]
    pub fn unreadable(path: impl Into<PathBuf>, error: &LoadError) -> Self {
        let mut report = Self::new(path);
        report.push(Defect::Unreadable {
            reason: error.to_string(),
        });
        report
    }

    /// The document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The defects found, in the order they were detected.
    #[must_use]
    pub fn defects(&self) -> &[Defect] {
        &self.defects
    }

    /// The warnings raised. Each distinct warning appears once.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Returns `true` if no defects were found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.defects.is_empty()
    }

    pub(crate) fn push(&mut self, defect: Defect) {
        tracing::debug!("{}: {defect}", self.path.display());
        self.defects.push(defect);
    }

    pub(crate) fn warn(&mut self, warning: Warning) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }
}
