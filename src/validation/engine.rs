use std::{collections::BTreeSet, path::Path};

use tracing::instrument;

use crate::{
    domain::{
        Config, ParameterRef, ReferenceKind, RequirementEntry, Scalar, TestLabel, Value,
        metadata::References,
    },
    storage::{BodyReferences, Document},
    validation::{
        index::VersionIndex,
        report::{Defect, Report, Warning},
        resolver::Resolver,
    },
};

/// Checks a requirement document against its own metadata and the workspace.
#[derive(Debug, Clone, Copy)]
pub struct Engine<'a> {
    config: &'a Config,
    resolver: Resolver<'a>,
    index: &'a VersionIndex,
}

impl<'a> Engine<'a> {
    /// Creates an engine for the workspace at `root`.
    #[must_use]
    pub const fn new(root: &'a Path, config: &'a Config, index: &'a VersionIndex) -> Self {
        Self {
            config,
            resolver: Resolver::new(root, config),
            index,
        }
    }

    /// Loads and validates the document at `path`.
    ///
    /// A document that cannot be read yields a report with a single
    /// [`Defect::Unreadable`].
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn validate(&self, path: &Path) -> Report {
        match Document::load(path, self.config) {
            Ok(document) => self.validate_document(&document),
            Err(e) => Report::unreadable(path, &e),
        }
    }

    /// Validates a document that has already been loaded.
    ///
    /// Every check runs regardless of the outcome of the others, so the report
    /// holds the complete set of defects. Without a metadata block only the
    /// body references are resolved.
    #[must_use]
    pub fn validate_document(&self, document: &Document) -> Report {
        let mut report = Report::new(document.path());
        let used = document.references();

        if let Some(metadata) = document.metadata() {
            let declared = metadata.references();
            check_order(declared, &mut report);
            check_requirement_entries(declared, &mut report);
            reconcile(declared, used, &mut report);
            self.check_staleness(declared, used, &mut report);
        } else {
            tracing::debug!("no metadata block, only resolving body references");
        }

        self.resolve(used, &mut report);
        report
    }

    fn resolve(&self, used: &BodyReferences, report: &mut Report) {
        for reference in &used.parameters {
            if let Err(e) = self.resolver.resolve_parameter(reference) {
                report.push(e.into());
            }
        }
        for reference in &used.requirements {
            match self.resolver.resolve_requirement(reference) {
                Ok(Some(warning)) => report.warn(warning),
                Ok(None) => {}
                Err(e) => report.push(e.into()),
            }
        }
        for reference in &used.tests {
            if let Err(e) = self.resolver.resolve_test(reference) {
                report.push(e.into());
            }
        }
    }

    /// Compares the versions recorded in the metadata with the versions the
    /// linked requirements currently declare.
    fn check_staleness(&self, declared: References<'_>, used: &BodyReferences, report: &mut Report) {
        for entry in declared.requirements() {
            let (Some(path), Some(recorded)) = (entry.path(), entry.version()) else {
                continue;
            };
            for reference in used.requirements.iter().filter(|r| r.path == path) {
                let Some(current) = self.index.get(&reference.id) else {
                    continue;
                };
                if current.version != Some(recorded) {
                    tracing::warn!(
                        "{} recorded at version {recorded} in metadata, current version is {:?}",
                        reference.id,
                        current.version
                    );
                    report.warn(Warning::Stale {
                        id: reference.id.clone(),
                        path: path.to_string(),
                        recorded,
                        current: current.version,
                    });
                }
            }
        }
    }
}

/// Checks that each scalar reference list is in ascending order.
fn check_order(declared: References<'_>, report: &mut Report) {
    for kind in [
        ReferenceKind::Parameters,
        ReferenceKind::Tests,
        ReferenceKind::Standards,
    ] {
        let actual: Vec<String> = match declared.get(kind) {
            Some(Value::List(items)) => items.iter().map(ToString::to_string).collect(),
            Some(Value::MapList(_)) => {
                tracing::debug!(
                    "'{kind}' entries were read as `key: value` pairs and their order is not                      checked; add their prefix to `scalar_prefixes` to keep them plain values"
                );
                continue;
            }
            _ => continue,
        };
        if let Some(defect) = unsorted(kind, actual) {
            report.push(defect);
        }
    }
}

/// Checks the shape of each requirement entry and their order by path.
fn check_requirement_entries(declared: References<'_>, report: &mut Report) {
    let entries = declared.requirements();
    let mut actual = Vec::with_capacity(entries.len());

    for (i, entry) in entries.iter().enumerate() {
        match entry {
            RequirementEntry::Map(map) => {
                let path = map.scalar("path").map(Scalar::to_string);
                if !map.contains_key("path") {
                    report.push(Defect::MissingKey {
                        position: i + 1,
                        key: "path",
                        path: None,
                    });
                }
                if !map.contains_key("version") {
                    report.push(Defect::MissingKey {
                        position: i + 1,
                        key: "version",
                        path: Some(path.clone().unwrap_or_else(|| "unknown".to_string())),
                    });
                }
                actual.push(path.unwrap_or_default());
            }
            RequirementEntry::Bare(value) => {
                report.push(Defect::NotAMap {
                    value: value.to_string(),
                });
                actual.push(value.to_string());
            }
        }
    }

    if let Some(defect) = unsorted(ReferenceKind::Requirements, actual) {
        report.push(defect);
    }
}

fn unsorted(kind: ReferenceKind, actual: Vec<String>) -> Option<Defect> {
    let mut expected = actual.clone();
    expected.sort();
    (actual != expected).then_some(Defect::Unsorted {
        kind,
        actual,
        expected,
    })
}

/// Checks that declared and used references mirror each other.
fn reconcile(declared: References<'_>, used: &BodyReferences, report: &mut Report) {
    let parameters = scalar_set(declared, ReferenceKind::Parameters);
    let used_parameters: BTreeSet<&str> = used.parameters.iter().map(ParameterRef::anchor).collect();
    report_differences(
        ReferenceKind::Parameters,
        &parameters,
        &used_parameters,
        |declared, used| declared == used,
        report,
    );

    let requirements: BTreeSet<&str> = declared
        .requirements()
        .iter()
        .filter_map(RequirementEntry::path)
        .collect();
    let used_requirements: BTreeSet<&str> =
        used.requirements.iter().map(|r| r.path.as_str()).collect();
    report_differences(
        ReferenceKind::Requirements,
        &requirements,
        &used_requirements,
        |declared, used| declared == used,
        report,
    );

    let tests = scalar_set(declared, ReferenceKind::Tests);
    let used_tests: BTreeSet<&str> = used.tests.iter().map(|r| r.label.as_str()).collect();
    report_differences(
        ReferenceKind::Tests,
        &tests,
        &used_tests,
        declares_test,
        report,
    );
}

fn scalar_set<'a>(declared: References<'a>, kind: ReferenceKind) -> BTreeSet<&'a str> {
    declared
        .scalars(kind)
        .into_iter()
        .map(Scalar::as_str)
        .collect()
}

/// A declared test is either a full label or the bare target name.
fn declares_test(declared: &str, label: &str) -> bool {
    if declared.starts_with("//") {
        declared == label
    } else {
        TestLabel::parse(label).is_ok_and(|label| label.target == declared)
    }
}

fn report_differences(
    kind: ReferenceKind,
    declared: &BTreeSet<&str>,
    used: &BTreeSet<&str>,
    matches: impl Fn(&str, &str) -> bool,
    report: &mut Report,
) {
    for &value in declared
        .iter()
        .filter(|&&d| !used.iter().any(|&u| matches(d, u)))
    {
        report.push(Defect::DeclaredUnused {
            kind,
            value: value.to_string(),
        });
    }
    for &value in used
        .iter()
        .filter(|&&u| !declared.iter().any(|&d| matches(d, u)))
    {
        report.push(Defect::UsedUndeclared {
            kind,
            value: value.to_string(),
        });
    }
}
