//! Resolution of body references against the workspace.
//!
//! Each check is a shallow textual proxy: a parameter is defined if its
//! anchor appears quoted in the parameter file, and a test target exists if
//! its build file assigns `name = "target"`. Neither file is parsed.

use std::path::{Path, PathBuf};

use crate::{
    domain::{
        Config, ParameterRef, ReferenceKind, RequirementRef, TestLabel, TestRef,
        reference::LabelError,
    },
    validation::{
        identity::{FrontmatterLookup, HeadingBlockLookup, Identity, IdentityLookup},
        report::Warning,
    },
};

/// Why a body reference does not resolve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The parameter link text differs from the anchor it points at.
    #[error("parameter link text '{name}' does not match anchor '{anchor}' in {target}")]
    AnchorMismatch {
        /// The link text.
        name: String,
        /// The anchor in the target.
        anchor: String,
        /// The full link target.
        target: String,
    },

    /// The referenced file does not exist.
    #[error("{noun} file does not exist: {path}", noun = .kind.noun())]
    MissingFile {
        /// The reference kind.
        kind: ReferenceKind,
        /// The path as referenced.
        path: String,
    },

    /// The parameter file does not mention the anchor.
    #[error("parameter '{anchor}' not found in {path}")]
    UndefinedParameter {
        /// The anchor that was looked for.
        anchor: String,
        /// The parameter file.
        path: String,
    },

    /// The requirement link points at a file that is not a requirement
    /// document.
    #[error("requirement link '{target}' does not point to a requirement document (expected one of: {expected})")]
    UnsupportedExtension {
        /// The link target.
        target: String,
        /// The accepted extensions.
        expected: String,
    },

    /// The requirement file declares a different id.
    #[error("requirement file {path} does not contain ID '{id}' (found '{found}')")]
    IdMismatch {
        /// The id used in the link.
        id: String,
        /// The requirement file.
        path: String,
        /// The id the file declares, or empty if none was found.
        found: String,
    },

    /// The test label is not of the form `//package:target`.
    #[error("invalid test label format ({reason}): {label}")]
    MalformedLabel {
        /// The label as written.
        label: String,
        /// What is wrong with it.
        reason: LabelError,
    },

    /// The test link text differs from the target name in the label.
    #[error("test link text '{name}' does not match target name '{target}' in {label}")]
    TargetMismatch {
        /// The link text.
        name: String,
        /// The target name in the label.
        target: String,
        /// The full label.
        label: String,
    },

    /// No build file exists in the test's package.
    #[error("no BUILD file found for package: //{package}")]
    MissingBuildFile {
        /// The package path.
        package: String,
    },

    /// The build file does not declare the test target.
    #[error("test target '{target}' not found in {path}")]
    UndefinedTarget {
        /// The target name.
        target: String,
        /// The build file that was searched.
        path: String,
    },

    /// A referenced file exists but could not be read.
    #[error("error reading {path}: {reason}")]
    Unreadable {
        /// The file.
        path: String,
        /// The I/O failure.
        reason: String,
    },
}

/// Resolves body references against files in a workspace.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    root: &'a Path,
    config: &'a Config,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver for the workspace at `root`.
    #[must_use]
    pub const fn new(root: &'a Path, config: &'a Config) -> Self {
        Self { root, config }
    }

    /// Checks that a parameter link names its anchor and that the anchor is
    /// defined in the target file.
    ///
    /// # Errors
    ///
    /// Returns the first check that fails.
    pub fn resolve_parameter(&self, reference: &ParameterRef) -> Result<(), ResolveError> {
        let anchor = reference.anchor();
        if reference.name != anchor {
            return Err(ResolveError::AnchorMismatch {
                name: reference.name.clone(),
                anchor: anchor.to_string(),
                target: reference.target.clone(),
            });
        }

        let path = reference.path();
        let content = self
            .read(path)?
            .ok_or_else(|| ResolveError::MissingFile {
                kind: ReferenceKind::Parameters,
                path: path.to_string(),
            })?;

        if contains_quoted(&content, anchor) {
            Ok(())
        } else {
            Err(ResolveError::UndefinedParameter {
                anchor: anchor.to_string(),
                path: path.to_string(),
            })
        }
    }

    /// Checks that a requirement link points at a requirement document
    /// declaring the linked id.
    ///
    /// If the link records a version that differs from the target's current
    /// version, a staleness warning is returned.
    ///
    /// # Errors
    ///
    /// Returns the first check that fails.
    pub fn resolve_requirement(
        &self,
        reference: &RequirementRef,
    ) -> Result<Option<Warning>, ResolveError> {
        if !self.config.is_requirement_path(Path::new(&reference.path)) {
            return Err(ResolveError::UnsupportedExtension {
                target: reference.target.clone(),
                expected: self
                    .config
                    .requirement_extensions()
                    .iter()
                    .map(|ext| format!(".{ext}"))
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        let content = self
            .read(&reference.path)?
            .ok_or_else(|| ResolveError::MissingFile {
                kind: ReferenceKind::Requirements,
                path: reference.path.clone(),
            })?;

        let identity = self.identify(&content, &reference.id).ok_or_else(|| {
            ResolveError::IdMismatch {
                id: reference.id.clone(),
                path: reference.path.clone(),
                found: String::new(),
            }
        })?;
        if identity.id != reference.id {
            return Err(ResolveError::IdMismatch {
                id: reference.id.clone(),
                path: reference.path.clone(),
                found: identity.id,
            });
        }

        Ok(reference
            .version
            .filter(|&recorded| identity.version != Some(recorded))
            .map(|recorded| {
                tracing::warn!(
                    "{} referenced at version {recorded}, current version is {:?}",
                    reference.id,
                    identity.version
                );
                Warning::Stale {
                    id: reference.id.clone(),
                    path: reference.path.clone(),
                    recorded,
                    current: identity.version,
                }
            }))
    }

    /// Checks that a test link names a target declared in its package's
    /// build file.
    ///
    /// # Errors
    ///
    /// Returns the first check that fails.
    pub fn resolve_test(&self, reference: &TestRef) -> Result<(), ResolveError> {
        let label =
            TestLabel::parse(&reference.label).map_err(|reason| ResolveError::MalformedLabel {
                label: reference.label.clone(),
                reason,
            })?;

        if reference.name != label.target {
            return Err(ResolveError::TargetMismatch {
                name: reference.name.clone(),
                target: label.target.to_string(),
                label: reference.label.clone(),
            });
        }

        let package = self.workspace_path(label.package);
        let build_file = self
            .config
            .build_files()
            .iter()
            .map(|name| package.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| ResolveError::MissingBuildFile {
                package: label.package.to_string(),
            })?;

        let display = build_file
            .strip_prefix(self.root)
            .unwrap_or(&build_file)
            .display()
            .to_string();
        let content =
            std::fs::read_to_string(&build_file).map_err(|e| ResolveError::Unreadable {
                path: display.clone(),
                reason: e.to_string(),
            })?;

        let declared = [
            format!("name = \"{}\"", label.target),
            format!("name = '{}'", label.target),
        ];
        if declared.iter().any(|needle| content.contains(needle)) {
            Ok(())
        } else {
            Err(ResolveError::UndefinedTarget {
                target: label.target.to_string(),
                path: display,
            })
        }
    }

    /// Reads the identity of a requirement document, preferring its metadata
    /// block and falling back to a heading block when that does not match.
    fn identify(&self, content: &str, wanted: &str) -> Option<Identity> {
        let primary = FrontmatterLookup::new(self.config).lookup(content, wanted);
        if primary.as_ref().is_some_and(|identity| identity.id == wanted) {
            return primary;
        }

        tracing::debug!("no matching metadata id for {wanted}, trying heading blocks");
        HeadingBlockLookup
            .lookup(content, wanted)
            .filter(|identity| identity.id == wanted)
            .or(primary)
    }

    /// Reads a workspace file. A missing file is `Ok(None)`.
    fn read(&self, path: &str) -> Result<Option<String>, ResolveError> {
        let full = self.workspace_path(path);
        if !full.is_file() {
            return Ok(None);
        }
        std::fs::read_to_string(&full)
            .map(Some)
            .map_err(|e| ResolveError::Unreadable {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// Joins a workspace-relative path onto the root. A leading `/` marks the
    /// workspace root, not the filesystem root.
    fn workspace_path(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

fn contains_quoted(content: &str, needle: &str) -> bool {
    content.contains(&format!("\"{needle}\"")) || content.contains(&format!("'{needle}'"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;
    use test_case::test_case;

    use super::*;

    fn workspace(files: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for (path, content) in files {
            let path = tmp.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        tmp
    }

    #[test_case("/params/brake.bzl#brake_distance"; "root-relative")]
    #[test_case("params/brake.bzl#brake_distance"; "relative")]
    #[test_case("params/brake.bzl"; "anchor from link text")]
    fn parameter_resolves(target: &str) {
        let tmp = workspace(&[("params/brake.bzl", "BRAKE = {\n    \"brake_distance\": {},\n}\n")]);
        let config = Config::default();
        let resolver = Resolver::new(tmp.path(), &config);

        resolver
            .resolve_parameter(&ParameterRef::new("brake_distance", target))
            .unwrap();
    }

    #[test]
    fn parameter_anchor_mismatch_wins_over_existence() {
        let tmp = workspace(&[("params/brake.bzl", "'brake_distance' 'max_speed'")]);
        let config = Config::default();
        let resolver = Resolver::new(tmp.path(), &config);

        let error = resolver
            .resolve_parameter(&ParameterRef::new(
                "brake_distance",
                "/params/brake.bzl#max_speed",
            ))
            .unwrap_err();

        assert_eq!(
            error,
            ResolveError::AnchorMismatch {
                name: "brake_distance".into(),
                anchor: "max_speed".into(),
                target: "/params/brake.bzl#max_speed".into(),
            }
        );
    }

    #[test]
    fn parameter_file_missing() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let error = Resolver::new(tmp.path(), &config)
            .resolve_parameter(&ParameterRef::new("a", "/params/a.bzl#a"))
            .unwrap_err();

        assert_eq!(error.to_string(), "parameter file does not exist: /params/a.bzl");
    }

    #[test]
    fn parameter_must_be_quoted() {
        let tmp = workspace(&[("p.bzl", "brake_distance = 1\n")]);
        let config = Config::default();
        let error = Resolver::new(tmp.path(), &config)
            .resolve_parameter(&ParameterRef::new("brake_distance", "p.bzl"))
            .unwrap_err();

        assert!(matches!(error, ResolveError::UndefinedParameter { .. }));
    }

    #[test]
    fn requirement_resolves_with_frontmatter_id() {
        let tmp = workspace(&[("reqs/REQ-2.md", "---\nid: REQ-2\nversion: 1\n---\n# Two\n")]);
        let config = Config::default();
        let resolver = Resolver::new(tmp.path(), &config);

        let warning = resolver
            .resolve_requirement(&RequirementRef::new("REQ-2", "reqs/REQ-2.md#scope"))
            .unwrap();
        assert_eq!(warning, None);
    }

    #[test]
    fn requirement_id_mismatch_is_independent_of_path() {
        let tmp = workspace(&[("REQ-2.md", "---\nid: REQ-3\n---\n")]);
        let config = Config::default();
        let error = Resolver::new(tmp.path(), &config)
            .resolve_requirement(&RequirementRef::new("REQ-2", "REQ-2.md"))
            .unwrap_err();

        assert_eq!(
            error,
            ResolveError::IdMismatch {
                id: "REQ-2".into(),
                path: "REQ-2.md".into(),
                found: "REQ-3".into(),
            }
        );
    }

    #[test]
    fn requirement_falls_back_to_heading_block() {
        let tmp = workspace(&[(
            "catalog.md",
            "# Catalog\n\n## REQ-9 Parking brake\n\n```\nid: REQ-9, version: 4\n```\n",
        )]);
        let config = Config::default();
        let resolver = Resolver::new(tmp.path(), &config);

        let warning = resolver
            .resolve_requirement(&RequirementRef::new("REQ-9", "catalog.md?version=3"))
            .unwrap();

        assert_eq!(
            warning,
            Some(Warning::Stale {
                id: "REQ-9".into(),
                path: "catalog.md".into(),
                recorded: 3,
                current: Some(4),
            })
        );
    }

    #[test]
    fn requirement_without_any_id() {
        let tmp = workspace(&[("REQ-2.md", "# Just prose\n")]);
        let config = Config::default();
        let error = Resolver::new(tmp.path(), &config)
            .resolve_requirement(&RequirementRef::new("REQ-2", "REQ-2.md"))
            .unwrap_err();

        assert!(matches!(error, ResolveError::IdMismatch { found, .. } if found.is_empty()));
    }

    #[test]
    fn requirement_missing_file() {
        let tmp = TempDir::new().unwrap();
        let config = Config::default();
        let error = Resolver::new(tmp.path(), &config)
            .resolve_requirement(&RequirementRef::new("REQ-2", "REQ-2.md"))
            .unwrap_err();

        assert_eq!(error.to_string(), "requirement file does not exist: REQ-2.md");
    }

    #[test]
    fn requirement_extension_follows_config() {
        let tmp = workspace(&[("REQ-2.markdown", "---\nid: REQ-2\n---\n")]);
        let config: Config = toml::from_str("_version = \"1\"\nrequirement_extensions = [\"md\"]\n").unwrap();
        let error = Resolver::new(tmp.path(), &config)
            .resolve_requirement(&RequirementRef::new("REQ-2", "REQ-2.markdown"))
            .unwrap_err();

        assert!(matches!(error, ResolveError::UnsupportedExtension { .. }));
    }

    #[test]
    fn requirement_version_without_current_version() {
        let tmp = workspace(&[("REQ-2.md", "---\nid: REQ-2\n---\n")]);
        let config = Config::default();
        let warning = Resolver::new(tmp.path(), &config)
            .resolve_requirement(&RequirementRef::new("REQ-2", "REQ-2.md?version=1"))
            .unwrap();

        assert!(matches!(warning, Some(Warning::Stale { current: None, .. })));
    }

    #[test_case("BUILD.bazel", "cc_test(\n    name = \"brake_test\",\n)\n"; "bazel file, double quotes")]
    #[test_case("BUILD", "py_test(name = 'brake_test')\n"; "plain file, single quotes")]
    fn test_resolves(build_file: &str, content: &str) {
        let path = format!("vehicle/brakes/{build_file}");
        let tmp = workspace(&[(path.as_str(), content)]);
        let config = Config::default();

        Resolver::new(tmp.path(), &config)
            .resolve_test(&TestRef::new("brake_test", "//vehicle/brakes:brake_test"))
            .unwrap();
    }

    #[test]
    fn build_bazel_is_preferred() {
        let tmp = workspace(&[
            ("pkg/BUILD.bazel", "name = \"other\""),
            ("pkg/BUILD", "name = \"t\""),
        ]);
        let config = Config::default();
        let error = Resolver::new(tmp.path(), &config)
            .resolve_test(&TestRef::new("t", "//pkg:t"))
            .unwrap_err();

        assert_eq!(
            error,
            ResolveError::UndefinedTarget {
                target: "t".into(),
                path: "pkg/BUILD.bazel".into(),
            }
        );
    }

    #[test_case("t", "pkg:t", ResolveError::MalformedLabel { label: "pkg:t".into(), reason: LabelError::MissingPrefix }; "relative label")]
    #[test_case("t", "//pkg", ResolveError::MalformedLabel { label: "//pkg".into(), reason: LabelError::MissingColon }; "missing colon")]
    #[test_case("t", "//pkg:u", ResolveError::TargetMismatch { name: "t".into(), target: "u".into(), label: "//pkg:u".into() }; "target mismatch")]
    #[test_case("t", "//nowhere:t", ResolveError::MissingBuildFile { package: "nowhere".into() }; "no build file")]
    fn test_failures(name: &str, label: &str, expected: ResolveError) {
        let tmp = workspace(&[("pkg/BUILD", "name = \"t\"")]);
        let config = Config::default();
        let error = Resolver::new(tmp.path(), &config)
            .resolve_test(&TestRef::new(name, label))
            .unwrap_err();

        assert_eq!(error, expected);
    }
}
