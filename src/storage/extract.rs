//! Extraction of reference links from a document body.
//!
//! Three link shapes are recognised:
//!
//! - parameters: `[@brake_distance](/params/brake.bzl#brake_distance)`
//! - requirements: `[REQ-2](reqs/REQ-2.md?version=3#rationale)`
//! - tests: `[brake_test](//vehicle/brakes:brake_test)`
//!
//! Requirement links only count when their path has one of the configured
//! requirement extensions. Test links need a `:` in the label, so
//! protocol-relative links such as `//example.com/guide` are ignored.

use std::{path::Path, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::domain::{Config, ParameterRef, RequirementRef, TestRef};

static PARAMETER_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[@([A-Za-z_][A-Za-z0-9_]*)\]\(([^)\s]+)\)").expect("Invalid regex")
});

static REQUIREMENT_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[([A-Z][A-Z0-9_-]+)\]\(([^)\s?#]+\.[A-Za-z0-9]+(?:\?[^)\s#]*)?(?:#[^)\s]*)?)\)",
    )
    .expect("Invalid regex")
});

static TEST_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([A-Za-z_][A-Za-z0-9_]*)\]\((//[^)\s:]*:[^)\s]+)\)").expect("Invalid regex")
});

/// All reference links found in a body, in order of appearance.
///
/// Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BodyReferences {
    /// Parameter links.
    pub parameters: Vec<ParameterRef>,
    /// Requirement links.
    pub requirements: Vec<RequirementRef>,
    /// Test links.
    pub tests: Vec<TestRef>,
}

impl BodyReferences {
    /// Returns `true` if the body has no reference links.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.requirements.is_empty() && self.tests.is_empty()
    }

    /// The total number of links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len() + self.requirements.len() + self.tests.len()
    }
}

/// Scans a body for reference links.
#[must_use]
pub fn extract(body: &str, config: &Config) -> BodyReferences {
    BodyReferences {
        parameters: PARAMETER_LINK
            .captures_iter(body)
            .map(|caps| ParameterRef::new(&caps[1], &caps[2]))
            .collect(),
        requirements: REQUIREMENT_LINK
            .captures_iter(body)
            .map(|caps| RequirementRef::new(&caps[1], &caps[2]))
            .filter(|reference| config.is_requirement_path(Path::new(&reference.path)))
            .collect(),
        tests: TEST_LINK
            .captures_iter(body)
            .map(|caps| TestRef::new(&caps[1], &caps[2]))
            .collect(),
    }
}
