use std::{
    io,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::{
    domain::{Config, Metadata},
    storage::{
        extract::{BodyReferences, extract},
        frontmatter::Parser,
    },
};

/// A requirement document: its metadata block, body and body references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    path: PathBuf,
    metadata: Option<Metadata>,
    #[serde(skip)]
    body: String,
    references: BodyReferences,
}

impl Document {
    /// Reads and parses a requirement document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read. Malformed or missing
    /// metadata is not an error.
    pub fn load(path: &Path, config: &Config) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Ok(Self::parse(path.to_path_buf(), &text, config))
    }

    /// Parses document text that has already been read.
    #[must_use]
    pub fn parse(path: PathBuf, text: &str, config: &Config) -> Self {
        let parsed = Parser::new(config).parse(text);
        let references = extract(&parsed.body, config);
        tracing::trace!(
            "parsed {}: metadata={}, {} body references",
            path.display(),
            parsed.metadata.is_some(),
            references.len()
        );
        Self {
            path,
            metadata: parsed.metadata.map(Metadata::new),
            body: parsed.body,
            references,
        }
    }

    /// The path the document was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The metadata block, if the document has one.
    #[must_use]
    pub const fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// The body text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The reference links found in the body.
    #[must_use]
    pub const fn references(&self) -> &BodyReferences {
        &self.references
    }
}

/// Errors that can occur when reading a requirement document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The document does not exist.
    #[error("requirement file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// The document could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The document path.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
}
