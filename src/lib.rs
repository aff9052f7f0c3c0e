//! Cross-reference validation for plain-text requirements
//!
//! Requirements are markdown documents with a metadata block declaring the
//! parameters, requirements, tests and standards they trace to. The body links
//! to the same artifacts. This crate checks that the two agree, that the
//! declarations are ordered, and that every link resolves to a real artifact
//! in the workspace.

pub mod domain;
pub use domain::{Config, ConfigError, Metadata, ReferenceKind};

/// Reading and parsing requirement documents.
pub mod storage;
pub use storage::{Document, LoadError};

pub mod validation;
pub use validation::{Batch, BatchReport, Defect, Engine, Report, VersionIndex, Warning};
