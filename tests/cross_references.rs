//! End-to-end validation of small requirement workspaces.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::TempDir;
use traceability::{
    Batch, BatchReport, Config, Defect, ReferenceKind, Warning, validation::ResolveError,
};

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, path: &str, content: &str) -> &Self {
        let path = self.root().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    fn validate(&self, paths: &[&str]) -> BatchReport {
        let config = Config::load_or_default(self.root());
        let inputs: Vec<PathBuf> = paths.iter().map(PathBuf::from).collect();
        Batch::new(self.root(), &config).run(&inputs)
    }
}

fn brake_parameters(workspace: &Workspace) {
    workspace.write(
        "params/brake.bzl",
        "BRAKE_PARAMS = {\n    \"brake_distance\": {\"unit\": \"m\"},\n    \"max_speed\": {\"unit\": \"km/h\"},\n}\n",
    );
}

#[test]
fn mirrored_parameter_reference_passes() {
    let workspace = Workspace::new();
    brake_parameters(&workspace);
    workspace.write(
        "REQ-1.md",
        "---
id: REQ-1
version: 1
references:
  parameters:
    - brake_distance
---
# Braking

The vehicle stops within [@brake_distance](/params/brake.bzl#brake_distance).
",
    );

    let report = workspace.validate(&["REQ-1.md"]);

    assert!(report.is_success(), "{:?}", report.reports());
    assert_eq!(report.document_count(), 1);
}

#[test]
fn mismatched_anchor_is_reported_three_ways() {
    let workspace = Workspace::new();
    brake_parameters(&workspace);
    workspace.write(
        "REQ-1.md",
        "---
id: REQ-1
references:
  parameters:
    - brake_distance
---
The vehicle stops within [@brake_distance](/params/brake.bzl#max_speed).
",
    );

    let report = workspace.validate(&["REQ-1.md"]);
    let defects = report.reports()[0].defects();

    assert_eq!(defects.len(), 3);
    assert!(defects.contains(&Defect::Unresolved(ResolveError::AnchorMismatch {
        name: "brake_distance".into(),
        anchor: "max_speed".into(),
        target: "/params/brake.bzl#max_speed".into(),
    })));
    assert!(defects.contains(&Defect::DeclaredUnused {
        kind: ReferenceKind::Parameters,
        value: "brake_distance".into(),
    }));
    assert!(defects.contains(&Defect::UsedUndeclared {
        kind: ReferenceKind::Parameters,
        value: "max_speed".into(),
    }));
}

#[test]
fn unsorted_tests_give_one_ordering_defect() {
    let workspace = Workspace::new();
    workspace.write(
        "vehicle/brakes/BUILD.bazel",
        "cc_test(\n    name = \"test_a\",\n)\n\ncc_test(\n    name = \"test_b\",\n)\n",
    );
    workspace.write(
        "REQ-1.md",
        "---
id: REQ-1
references:
  tests:
    - test_b
    - test_a
---
Covered by [test_a](//vehicle/brakes:test_a) and [test_b](//vehicle/brakes:test_b).
",
    );

    let report = workspace.validate(&["REQ-1.md"]);
    let defects = report.reports()[0].defects();

    assert_eq!(defects.len(), 1);
    let message = defects[0].to_string();
    assert!(message.contains("Current order: ['test_b', 'test_a']"));
    assert!(message.contains("Expected order: ['test_a', 'test_b']"));
}

#[test]
fn requirement_links_resolve_across_documents() {
    let workspace = Workspace::new();
    workspace
        .write(
            "reqs/REQ-1.md",
            "---
id: REQ-1
version: 1
references:
  requirements:
    - path: reqs/REQ-2.md
      version: 1
---
Refines [REQ-2](reqs/REQ-2.md#scope).
",
        )
        .write(
            "reqs/REQ-2.md",
            "---\nid: REQ-2\nversion: 1\n---\n# Scope\n",
        );

    let report = workspace.validate(&["reqs"]);

    assert_eq!(report.document_count(), 2);
    assert!(report.is_success(), "{:?}", report.reports());
    assert_eq!(report.warning_count(), 0);
}

#[test]
fn wrong_link_text_is_an_id_mismatch() {
    let workspace = Workspace::new();
    workspace
        .write(
            "REQ-1.md",
            "---
id: REQ-1
references:
  requirements:
    - path: REQ-2.md
      version: 1
---
Refines [REQ-3](REQ-2.md).
",
        )
        .write("REQ-2.md", "---\nid: REQ-2\nversion: 1\n---\n");

    let report = workspace.validate(&["REQ-1.md"]);

    assert_eq!(
        report.reports()[0].defects(),
        &[Defect::Unresolved(ResolveError::IdMismatch {
            id: "REQ-3".into(),
            path: "REQ-2.md".into(),
            found: "REQ-2".into(),
        })]
    );
}

#[test]
fn outdated_versions_warn_without_failing() {
    let workspace = Workspace::new();
    workspace
        .write(
            "REQ-1.md",
            "---
id: REQ-1
references:
  requirements:
    - path: REQ-2.md
      version: 1
---
Refines [REQ-2](REQ-2.md?version=1).
",
        )
        .write("REQ-2.md", "---\nid: REQ-2\nversion: 3\n---\n");

    let report = workspace.validate(&["REQ-1.md", "REQ-2.md"]);

    assert!(report.is_success());
    assert_eq!(
        report.reports()[0].warnings(),
        &[Warning::Stale {
            id: "REQ-2".into(),
            path: "REQ-2.md".into(),
            recorded: 1,
            current: Some(3),
        }]
    );
}

#[test]
fn documents_are_validated_once() {
    let workspace = Workspace::new();
    workspace.write("REQ-1.md", "---\nid: REQ-1\n---\n");

    let report = workspace.validate(&["REQ-1.md", ".", "REQ-1.md"]);

    assert_eq!(report.document_count(), 1);
}

#[test]
fn configuration_changes_build_file_lookup() {
    let workspace = Workspace::new();
    workspace
        .write(
            ".req/traceability.toml",
            "_version = \"1\"\nbuild_files = [\"TARGETS\"]\n",
        )
        .write("pkg/BUILD.bazel", "name = \"unit_test\"\n")
        .write("pkg/TARGETS", "name = 'unit_test'\n")
        .write(
            "REQ-1.md",
            "---\nid: REQ-1\nreferences:\n  tests:\n    - //pkg:unit_test\n---\n\
             [unit_test](//pkg:unit_test)\n",
        );

    let report = workspace.validate(&["REQ-1.md"]);

    assert!(report.is_success(), "{:?}", report.reports());
}

#[test]
fn protocol_relative_links_are_plain_links() {
    let workspace = Workspace::new();
    workspace.write(
        "REQ-1.md",
        "---\nid: REQ-1\n---\nSee [docs](//example.com/guide) for background.\n",
    );

    let report = workspace.validate(&["REQ-1.md"]);

    assert!(report.is_success(), "{:?}", report.reports());
}

#[test]
fn configured_extensions_are_collected_and_linked() {
    let workspace = Workspace::new();
    workspace
        .write(
            ".req/traceability.toml",
            "_version = \"1\"\nrequirement_extensions = [\"req\"]\n",
        )
        .write(
            "reqs/REQ-1.req",
            "---
id: REQ-1
references:
  requirements:
    - path: reqs/REQ-2.req
      version: 1
---
Refines [REQ-2](reqs/REQ-2.req).
",
        )
        .write("reqs/REQ-2.req", "---\nid: REQ-2\nversion: 1\n---\n")
        .write("reqs/notes.md", "[REQ-9](reqs/REQ-9.md)\n");

    let report = workspace.validate(&["reqs"]);

    assert_eq!(report.document_count(), 2);
    assert!(report.is_success(), "{:?}", report.reports());
}
