//! References between a requirement document and the artifacts it traces to.

use std::fmt;

use serde::Serialize;

/// The kinds of reference a requirement can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    /// Parameter definitions.
    Parameters,
    /// Other requirement documents.
    Requirements,
    /// Test targets.
    Tests,
    /// External standards. Declaration-only; these never appear in the body.
    Standards,
}

impl ReferenceKind {
    /// The key used for this kind under `references` in the metadata block.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Parameters => "parameters",
            Self::Requirements => "requirements",
            Self::Tests => "tests",
            Self::Standards => "standards",
        }
    }

    /// The singular noun used in diagnostics.
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Parameters => "parameter",
            Self::Requirements => "requirement",
            Self::Tests => "test",
            Self::Standards => "standard",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A body link to a parameter: `[@name](path#anchor)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterRef {
    /// The link text, without the leading `@`.
    pub name: String,
    /// The link target, `path[#anchor]`.
    pub target: String,
}

impl ParameterRef {
    /// Creates a parameter reference.
    #[must_use]
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
        }
    }

    /// The file part of the target.
    #[must_use]
    pub fn path(&self) -> &str {
        self.target
            .split_once('#')
            .map_or(self.target.as_str(), |(path, _)| path)
    }

    /// The anchor naming the parameter.
    ///
    /// Defaults to the link text when the target carries no anchor.
    #[must_use]
    pub fn anchor(&self) -> &str {
        self.target
            .split_once('#')
            .map_or(self.name.as_str(), |(_, anchor)| anchor)
    }
}

/// A body link to another requirement: `[ID](path[?version=N][#fragment])`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementRef {
    /// The link text, which must be the target's id.
    pub id: String,
    /// The link target as written.
    pub target: String,
    /// The target with any query and fragment removed.
    pub path: String,
    /// The version recorded in a `?version=N` query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// The fragment after `#`, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
}

impl RequirementRef {
    /// Parses a requirement link target.
    #[must_use]
    pub fn new(id: impl Into<String>, target: impl Into<String>) -> Self {
        let target = target.into();
        let (before_fragment, fragment) = match target.split_once('#') {
            Some((head, fragment)) => (head, Some(fragment.to_string())),
            None => (target.as_str(), None),
        };
        let (path, query) = before_fragment
            .split_once('?')
            .unwrap_or((before_fragment, ""));
        let version = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("version="))
            .and_then(|v| v.parse().ok());
        let path = path.to_string();

        Self {
            id: id.into(),
            path,
            version,
            fragment,
            target,
        }
    }
}

/// A body link to a test target: `[name](//package:target)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRef {
    /// The link text, which must be the target name.
    pub name: String,
    /// The build label.
    pub label: String,
}

impl TestRef {
    /// Creates a test reference.
    #[must_use]
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }

    /// The target name after the `:` of the label, if the label is well formed.
    #[must_use]
    pub fn target_name(&self) -> Option<&str> {
        TestLabel::parse(&self.label).ok().map(|label| label.target)
    }
}

/// A parsed build label, `//package/path:target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestLabel<'a> {
    /// The package directory, relative to the workspace root.
    pub package: &'a str,
    /// The target name.
    pub target: &'a str,
}

impl<'a> TestLabel<'a> {
    /// Parses a label.
    ///
    /// # Errors
    ///
    /// Returns an error if the label does not start with `//` or does not
    /// contain exactly one `:`.
    pub fn parse(label: &'a str) -> Result<Self, LabelError> {
        let rest = label.strip_prefix("//").ok_or(LabelError::MissingPrefix)?;
        let mut parts = rest.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(package), Some(target), None) => Ok(Self { package, target }),
            (_, None, _) => Err(LabelError::MissingColon),
            _ => Err(LabelError::ExtraColon),
        }
    }
}

/// Reasons a build label is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    /// The label is not workspace-absolute.
    #[error("label must start with '//'")]
    MissingPrefix,
    /// No `:` separates package and target.
    #[error("missing ':'")]
    MissingColon,
    /// More than one `:` in the label.
    #[error("more than one ':'")]
    ExtraColon,
}
