use std::{
    path::{Path, PathBuf},
    process,
};

use clap::Parser;
use serde_json::json;
use tracing::instrument;
use traceability::{Batch, BatchReport, Config};

use super::{
    display_path,
    terminal::{Colorize, rule},
};

#[derive(Debug, Default, Parser)]
#[command(about = "Validate cross-references between requirements and their artifacts")]
pub struct Validate {
    /// Requirement documents or directories to validate, relative to the
    /// workspace root (defaults to the whole workspace)
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
    Summary,
}

impl Validate {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, root: &Path, config: &Config) -> anyhow::Result<()> {
        let inputs = if self.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.paths.clone()
        };

        let report = Batch::new(root, config).run(&inputs);

        match self.output {
            OutputFormat::Table => self.output_table(root, &report),
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&json_report(root, &report))?);
            }
            OutputFormat::Summary => Self::output_summary(&report),
        }

        if !report.is_success() {
            process::exit(1);
        }

        Ok(())
    }

    fn output_table(&self, root: &Path, report: &BatchReport) {
        for document in report.reports() {
            let has_warnings = !self.quiet && !document.warnings().is_empty();
            if document.is_clean() && !has_warnings {
                continue;
            }

            println!("{}", display_path(root, document.path()));
            for defect in document.defects() {
                println!("  {} {defect}", "ERROR:".error());
            }
            if has_warnings {
                for warning in document.warnings() {
                    println!("  {} {warning}", "WARNING:".warning());
                }
            }
        }

        if report.is_success() {
            if !self.quiet {
                println!(
                    "{}",
                    format!(
                        "Cross-reference validation passed for {} requirement(s)",
                        report.document_count()
                    )
                    .success()
                );
            }
        } else {
            println!("{}", rule().dim());
            println!(
                "{}",
                format!(
                    "Cross-reference validation failed: {} error(s) in {} requirement(s)",
                    report.defect_count(),
                    report.reports().iter().filter(|r| !r.is_clean()).count()
                )
                .error()
            );
        }
    }

    fn output_summary(report: &BatchReport) {
        println!(
            "documents={} defects={} warnings={}",
            report.document_count(),
            report.defect_count(),
            report.warning_count()
        );
    }
}

fn json_report(root: &Path, report: &BatchReport) -> serde_json::Value {
    let documents: Vec<_> = report
        .reports()
        .iter()
        .map(|document| {
            json!({
                "path": display_path(root, document.path()),
                "defects": document.defects().iter().map(ToString::to_string).collect::<Vec<_>>(),
                "warnings": document.warnings().iter().map(ToString::to_string).collect::<Vec<_>>(),
            })
        })
        .collect();

    json!({
        "status": if report.is_success() { "passed" } else { "failed" },
        "documents": documents,
        "summary": {
            "documents": report.document_count(),
            "defects": report.defect_count(),
            "warnings": report.warning_count()
        }
    })
}
