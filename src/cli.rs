use std::path::{Path, PathBuf};

mod init;
mod show;
mod terminal;
mod validate;

use clap::ArgAction;
use init::Init;
use show::Show;
use traceability::Config;
use validate::Validate;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the root of the workspace
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// Load configuration from this file instead of `.req/traceability.toml`
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::Validate(Validate::default()))
            .run(&self.root, self.config.as_deref())
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Validate cross-references between requirements and their artifacts
    /// (default)
    Validate(Validate),

    /// Show the parsed metadata and body references of a document
    Show(Show),

    /// Write the default configuration to `.req/traceability.toml`
    Init(Init),
}

impl Command {
    fn run(self, root: &Path, config: Option<&Path>) -> anyhow::Result<()> {
        match self {
            Self::Validate(command) => command.run(root, &load_config(root, config)?)?,
            Self::Show(command) => command.run(root, &load_config(root, config)?)?,
            Self::Init(command) => command.run(root)?,
        }
        Ok(())
    }
}

/// Loads an explicitly requested config file, or the workspace default.
///
/// Only the explicit file is required to exist.
fn load_config(root: &Path, explicit: Option<&Path>) -> anyhow::Result<Config> {
    Ok(match explicit {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(root),
    })
}

/// Formats a path relative to the workspace root where possible.
fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
