use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};

use clap::Parser;
use tracing::instrument;
use traceability::{Config, Document, ReferenceKind};

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Display the parsed metadata and body references of a requirement")]
pub struct Show {
    /// The requirement document, relative to the workspace root
    path: PathBuf,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
    Yaml,
}

impl Show {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, root: &Path, config: &Config) -> anyhow::Result<()> {
        let document = Document::load(&root.join(&self.path), config)?;
        println!("{}", render(&document, self.output)?);
        Ok(())
    }
}

fn render(document: &Document, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Pretty => pretty(document)?,
        OutputFormat::Json => serde_json::to_string_pretty(document)?,
        OutputFormat::Yaml => serde_yaml::to_string(document)?,
    })
}

fn pretty(document: &Document) -> Result<String, std::fmt::Error> {
    let mut out = String::new();

    let Some(metadata) = document.metadata() else {
        writeln!(out, "{}", document.path().display())?;
        writeln!(out, "{}", "No metadata block".dim())?;
        return Ok(out);
    };

    writeln!(out, "# {}", metadata.id().unwrap_or("(no id)"))?;
    if let Some(title) = metadata.title() {
        writeln!(out, "{title}")?;
    }

    writeln!(out, "\n{}", "Metadata".dim())?;
    writeln!(out, "  Path:      {}", document.path().display())?;
    if let Some(version) = metadata.version() {
        writeln!(out, "  Version:   {version}")?;
    }
    for (label, value) in [
        ("Status:   ", metadata.status()),
        ("Priority: ", metadata.priority()),
        ("Type:     ", metadata.kind()),
    ] {
        if let Some(value) = value {
            writeln!(out, "  {label} {value}")?;
        }
    }

    let references = metadata.references();
    for kind in [
        ReferenceKind::Parameters,
        ReferenceKind::Tests,
        ReferenceKind::Standards,
    ] {
        let declared = references.scalars(kind);
        if !declared.is_empty() {
            writeln!(out, "\n{}", capitalize(kind.key()).dim())?;
            for value in declared {
                writeln!(out, "  • {value}")?;
            }
        }
    }

    let requirements = references.requirements();
    if !requirements.is_empty() {
        writeln!(out, "\n{}", "Requirements".dim())?;
        for entry in requirements {
            match (entry.path(), entry.version()) {
                (Some(path), Some(version)) => writeln!(out, "  • {path} (v{version})")?,
                (Some(path), None) => writeln!(out, "  • {path}")?,
                (None, _) => writeln!(out, "  • {}", "(no path)".warning())?,
            }
        }
    }

    let used = document.references();
    writeln!(
        out,
        "\n{} {} parameter(s), {} requirement(s), {} test(s)",
        "Body links:".dim(),
        used.parameters.len(),
        used.requirements.len(),
        used.tests.len()
    )?;

    Ok(out)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
