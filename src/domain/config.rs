use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration for cross-reference validation.
///
/// This struct holds the conventions used to recognise requirement documents,
/// build declarations and reference values in a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// File extensions (without the dot) of requirement documents. Used both
    /// when walking directories and when recognising requirement links.
    requirement_extensions: Vec<String>,

    /// Build declaration file names, in lookup order.
    build_files: Vec<String>,

    /// List items starting with one of these prefixes are always plain
    /// values, even if they contain a `key: value` shape.
    ///
    /// For example, build labels (`//pkg:target`) and standards
    /// (`ISO 26262-6:2018`).
    scalar_prefixes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            requirement_extensions: default_requirement_extensions(),
            build_files: default_build_files(),
            scalar_prefixes: default_scalar_prefixes(),
        }
    }
}

impl Config {
    /// The location of the configuration file relative to the workspace root.
    pub const DEFAULT_PATH: &'static str = ".req/traceability.toml";

    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the configuration from its default location under `root`.
    ///
    /// Falls back to the default configuration if there is no file or it
    /// cannot be parsed.
    #[must_use]
    pub fn load_or_default(root: &Path) -> Self {
        let path = root.join(Self::DEFAULT_PATH);
        Self::load(&path).unwrap_or_else(|e| {
            tracing::debug!("Failed to load config: {e}");
            Self::default()
        })
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// The recognised requirement document extensions.
    #[must_use]
    pub fn requirement_extensions(&self) -> &[String] {
        &self.requirement_extensions
    }

    /// The build declaration file names, in lookup order.
    #[must_use]
    pub fn build_files(&self) -> &[String] {
        &self.build_files
    }

    /// Prefixes marking list items as plain values.
    #[must_use]
    pub fn scalar_prefixes(&self) -> &[String] {
        &self.scalar_prefixes
    }

    /// Checks whether a path has a requirement document extension.
    #[must_use]
    pub fn is_requirement_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.requirement_extensions.iter().any(|e| e == ext))
    }
}

/// Errors that can occur when loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        /// The config file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not a valid configuration.
    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        /// The config file path.
        path: PathBuf,
        /// The underlying TOML error.
        source: toml::de::Error,
    },
}

fn default_requirement_extensions() -> Vec<String> {
    vec!["md".to_string(), "markdown".to_string()]
}

fn default_build_files() -> Vec<String> {
    vec!["BUILD.bazel".to_string(), "BUILD".to_string()]
}

fn default_scalar_prefixes() -> Vec<String> {
    vec!["//".to_string(), "ISO ".to_string()]
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_requirement_extensions")]
        requirement_extensions: Vec<String>,

        #[serde(default = "default_build_files")]
        build_files: Vec<String>,

        #[serde(default = "default_scalar_prefixes")]
        scalar_prefixes: Vec<String>,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                requirement_extensions,
                build_files,
                scalar_prefixes,
            } => Self {
                requirement_extensions,
                build_files,
                scalar_prefixes,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            requirement_extensions: config.requirement_extensions,
            build_files: config.build_files,
            scalar_prefixes: config.scalar_prefixes,
        }
    }
}
