//! # Configuration File Parser
//!
//! Reads `entseed.toml`, the optional file holding defaults for the CLI.
//! Flags given on the command line always win over the file.
//!
//! Example `entseed.toml`:
//!
//! ```toml
//! [database]
//! url = "postgres://localhost/app"
//!
//! [generate]
//! rows = 10000
//! seed = 42
//! restrict = ["Contact"]
//! output_dir = "data/inserts"
//! keep_files = false
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{EntseedError, Result};

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "entseed.toml";

/// Rows per entity (or edges) when neither the CLI nor the file says.
pub const DEFAULT_ROWS: usize = 10_000;

/// Where CSV files go when neither the CLI nor the file says.
pub const DEFAULT_OUTPUT_DIR: &str = "data/inserts";

/// Top-level entseed.toml structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EntseedConfig {
    pub database: DatabaseConfig,
    pub generate: GenerateConfig,

    /// Absolute path to the directory containing entseed.toml, so a relative
    /// `output_dir` resolves against the file rather than the CWD.
    #[serde(skip)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL URL the CSV files are loaded into.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Rows per generated entity, or edges in edge mode.
    pub rows: Option<usize>,
    /// Fixed random seed for reproducible runs.
    pub seed: Option<u64>,
    /// Entities that actively generate rows (empty = all).
    pub restrict: Option<Vec<String>>,
    pub output_dir: Option<PathBuf>,
    /// Keep the CSV files after loading.
    pub keep_files: Option<bool>,
}

/// Read and parse entseed.toml from the given directory.
///
/// Returns `None` if the file doesn't exist (config is optional).
/// Returns an error if the file exists but can't be parsed.
pub fn read_config(dir: &Path) -> Result<Option<EntseedConfig>> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| EntseedError::Config {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;

    let mut config: EntseedConfig =
        toml::from_str(&content).map_err(|e| EntseedError::Config {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?;

    config.config_dir = Some(std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf()));
    config.validate()?;

    Ok(Some(config))
}

impl EntseedConfig {
    /// Validate what serde cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if self.generate.rows == Some(0) {
            return Err(EntseedError::Config {
                message: "generate.rows must be at least 1".to_string(),
            });
        }
        if let Some(restrict) = &self.generate.restrict {
            if let Some(blank) = restrict.iter().find(|name| name.trim().is_empty()) {
                return Err(EntseedError::Config {
                    message: format!("generate.restrict contains an empty entity name: {:?}", blank),
                });
            }
        }
        if let Some(url) = &self.database.url {
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                return Err(EntseedError::Config {
                    message: format!(
                        "database.url must be a PostgreSQL URL, got '{}'",
                        crate::output::copy::sanitize_url(url)
                    ),
                });
            }
        }
        Ok(())
    }

    /// Output directory from the file, resolved against its location.
    pub fn output_dir(&self) -> Option<PathBuf> {
        let dir = self.generate.output_dir.as_ref()?;
        match &self.config_dir {
            Some(base) if dir.is_relative() => Some(base.join(dir)),
            _ => Some(dir.clone()),
        }
    }
}
