//! Finding the id and version a requirement document declares.
//!
//! Two strategies exist. [`FrontmatterLookup`] reads the metadata block and
//! is always tried first. [`HeadingBlockLookup`] is a fallback for documents
//! that describe a requirement under a heading, followed by a fenced block of
//! `key: value` pairs:
//!
//! ````text
//! ## REQ-7 Emergency braking
//!
//! ```
//! id: REQ-7, version: 3
//! ```
//! ````

use crate::{
    domain::{Config, Map, Metadata, Scalar, Value},
    storage::Parser,
};

/// The identity a requirement document declares for itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The requirement id.
    pub id: String,
    /// The requirement version, if declared.
    pub version: Option<u64>,
}

/// A way of reading a requirement's identity from its text.
pub trait IdentityLookup {
    /// Looks for the identity of the requirement `wanted` in `text`.
    ///
    /// Implementations may return an identity with a different id when the
    /// document declares one.
    fn lookup(&self, text: &str, wanted: &str) -> Option<Identity>;
}

/// Reads the identity from the document's metadata block.
#[derive(Debug, Clone, Copy)]
pub struct FrontmatterLookup<'a> {
    parser: Parser<'a>,
}

impl<'a> FrontmatterLookup<'a> {
    /// Creates a lookup parsing with the conventions in `config`.
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self {
            parser: Parser::new(config),
        }
    }
}

impl IdentityLookup for FrontmatterLookup<'_> {
    fn lookup(&self, text: &str, _wanted: &str) -> Option<Identity> {
        let metadata = Metadata::new(self.parser.parse(text).metadata?);
        Some(Identity {
            id: metadata.id()?.to_string(),
            version: metadata.version(),
        })
    }
}

/// Reads the identity from a heading naming the requirement and the fenced
/// block that follows it.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingBlockLookup;

impl IdentityLookup for HeadingBlockLookup {
    fn lookup(&self, text: &str, wanted: &str) -> Option<Identity> {
        let lines: Vec<&str> = text.lines().collect();

        lines.iter().enumerate().find_map(|(i, line)| {
            if !heading(line).is_some_and(|heading| names(heading, wanted)) {
                return None;
            }

            let mut rest = lines[i + 1..]
                .iter()
                .skip_while(|line| line.trim().is_empty());
            let fence = fence(rest.next()?)?;
            let block: Map = rest
                .take_while(|line| !line.trim_start().starts_with(fence))
                .flat_map(|line| inline_pairs(line))
                .collect();

            Some(Identity {
                id: block
                    .scalar("id")
                    .map_or(wanted, Scalar::as_str)
                    .to_string(),
                version: block.scalar("version").and_then(Scalar::as_int),
            })
        })
    }
}

/// The text of a markdown heading line.
fn heading(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('#')?;
    let rest = rest.trim_start_matches('#');
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then(|| rest.trim())
}

fn names(heading: &str, id: &str) -> bool {
    heading
        .split(|c: char| c.is_whitespace() || matches!(c, ':' | ',' | '(' | ')' | '[' | ']' | '`'))
        .any(|token| token == id)
}

/// The fence marker opening a code block.
fn fence(line: &str) -> Option<&'static str> {
    let line = line.trim_start();
    ["```", "~~~"]
        .into_iter()
        .find(|marker| line.starts_with(marker))
}

/// Splits a line into `key: value` pairs.
///
/// Several pairs may share a line when separated by commas.
fn inline_pairs(line: &str) -> Vec<(String, Value)> {
    let segments: Vec<&str> = line.split(',').collect();
    let segments = if segments.iter().all(|segment| segment.contains(':')) {
        segments
    } else {
        vec![line]
    };

    segments
        .into_iter()
        .filter_map(|segment| segment.split_once(':'))
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| (key.trim().to_string(), Value::from(value)))
        .collect()
}
