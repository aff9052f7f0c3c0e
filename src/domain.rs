//! Domain models for requirement traceability.
//!
//! This module contains the core domain types: the metadata value tree, the
//! typed metadata view, body references and configuration.

mod config;
pub use config::{Config, ConfigError};

/// Typed access to a document's metadata block.
pub mod metadata;
pub use metadata::{Metadata, RequirementEntry};

/// References from a document to parameters, requirements and tests.
pub mod reference;
pub use reference::{ParameterRef, ReferenceKind, RequirementRef, TestLabel, TestRef};

/// The schema-bounded value tree.
pub mod value;
pub use value::{Map, Scalar, Value};
