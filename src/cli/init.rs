use std::{fs, path::Path};

use clap::Parser;
use tracing::instrument;
use traceability::Config;

#[derive(Debug, Parser)]
#[command(about = "Write the default configuration file")]
pub struct Init {
    /// Overwrite an existing configuration file
    #[arg(long)]
    force: bool,
}

impl Init {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config_path = root.join(Config::DEFAULT_PATH);
        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Configuration already exists at {} (use --force to overwrite)",
                config_path.display()
            );
        }

        if let Some(dir) = config_path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", dir.display()))?;
        }

        Config::default()
            .save(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", Config::DEFAULT_PATH))?;

        println!("Initialized traceability configuration in {}", root.display());
        println!("  Created: {}", Config::DEFAULT_PATH);
        Ok(())
    }
}
