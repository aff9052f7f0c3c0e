//! Typed access to a requirement's metadata block.

use serde::Serialize;

use super::{
    reference::ReferenceKind,
    value::{Map, Scalar, Value},
};

/// The metadata block of a requirement document.
///
/// This is a thin typed view over the parsed [`Map`]. Unknown keys are kept
/// and serialized unchanged, so the record can be handed to report
/// generators as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Metadata {
    map: Map,
}

impl Metadata {
    /// Wraps a parsed map.
    #[must_use]
    pub const fn new(map: Map) -> Self {
        Self { map }
    }

    /// The underlying map.
    #[must_use]
    pub const fn as_map(&self) -> &Map {
        &self.map
    }

    /// The requirement id.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.text("id")
    }

    /// The requirement version.
    #[must_use]
    pub fn version(&self) -> Option<u64> {
        self.map.scalar("version").and_then(Scalar::as_int)
    }

    /// The requirement title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.text("title")
    }

    /// The lifecycle status (e.g. `draft`, `approved`).
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.text("status")
    }

    /// The priority.
    #[must_use]
    pub fn priority(&self) -> Option<&str> {
        self.text("priority")
    }

    /// The requirement type, stored under the `type` key.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.text("type")
    }

    /// The `references` section.
    #[must_use]
    pub fn references(&self) -> References<'_> {
        References {
            map: self.map.get("references").and_then(Value::as_map),
        }
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.map
            .scalar(key)
            .map(Scalar::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// A view of the `references` section of a metadata block.
#[derive(Debug, Clone, Copy)]
pub struct References<'a> {
    map: Option<&'a Map>,
}

impl<'a> References<'a> {
    /// The raw value declared for a reference kind.
    #[must_use]
    pub fn get(self, kind: ReferenceKind) -> Option<&'a Value> {
        self.map.and_then(|map| map.get(kind.key()))
    }

    /// The declared entries for a kind whose entries are plain scalars.
    ///
    /// A single scalar is treated as a one-element list. Map entries are
    /// not scalars and are left out.
    #[must_use]
    pub fn scalars(self, kind: ReferenceKind) -> Vec<&'a Scalar> {
        match self.get(kind) {
            Some(Value::Scalar(scalar)) if !scalar.as_str().is_empty() => vec![scalar],
            Some(Value::List(items)) => items.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// The declared requirement entries, in declaration order.
    #[must_use]
    pub fn requirements(self) -> Vec<RequirementEntry<'a>> {
        match self.get(ReferenceKind::Requirements) {
            Some(Value::MapList(maps)) => maps.iter().map(RequirementEntry::Map).collect(),
            Some(Value::List(items)) => items.iter().map(RequirementEntry::Bare).collect(),
            Some(Value::Scalar(scalar)) if !scalar.as_str().is_empty() => {
                vec![RequirementEntry::Bare(scalar)]
            }
            _ => Vec::new(),
        }
    }
}

/// One entry under `references.requirements`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementEntry<'a> {
    /// The expected form: a map with `path` and `version`.
    Map(&'a Map),
    /// A bare scalar. This is a schema defect, but the value still counts
    /// as a declared path.
    Bare(&'a Scalar),
}

impl<'a> RequirementEntry<'a> {
    /// The declared path, if there is a non-empty one.
    #[must_use]
    pub fn path(&self) -> Option<&'a str> {
        let path = match self {
            Self::Map(map) => map.scalar("path").map(Scalar::as_str),
            Self::Bare(scalar) => Some(scalar.as_str()),
        };
        path.filter(|p| !p.is_empty())
    }

    /// The declared version, if there is one.
    #[must_use]
    pub fn version(&self) -> Option<u64> {
        match self {
            Self::Map(map) => map.scalar("version").and_then(Scalar::as_int),
            Self::Bare(_) => None,
        }
    }
}
