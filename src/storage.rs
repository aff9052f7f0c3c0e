//! Reading requirement documents from disk.
//!
//! A document is split into its metadata block and body, the block is parsed
//! into a value tree and the body is scanned for reference links.

mod document;
pub use document::{Document, LoadError};

/// Extraction of reference links from document bodies.
pub mod extract;
pub use extract::{BodyReferences, extract};

/// Parsing of the metadata block.
pub mod frontmatter;
pub use frontmatter::{Parsed, Parser, parse, split};
