//! Cross-reference validation.
//!
//! The [`Engine`] checks one document: the ordering and shape of its declared
//! references, that declared and body references mirror each other, and that
//! every body reference resolves to a real artifact. The [`Batch`] runs the
//! engine over many documents and aggregates the results.

mod batch;
pub use batch::{Batch, BatchReport};

mod engine;
pub use engine::Engine;

pub mod identity;
pub use identity::{FrontmatterLookup, HeadingBlockLookup, Identity, IdentityLookup};

mod index;
pub use index::{IndexEntry, VersionIndex};

mod report;
pub use report::{Defect, Report, Warning};

mod resolver;
pub use resolver::{ResolveError, Resolver};
