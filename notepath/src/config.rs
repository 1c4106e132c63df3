//! Configuration management for notepath.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Environment variables (NOTEPATH_*)
//! 2. Config file (NOTEPATH_CONFIG, or config.toml in the data directory)
//! 3. Default values

use anyhow::{Context, Result};
use directories::ProjectDirs;
use notepath_core::archive::ARCHIVE_FILENAME;
use notepath_core::db::DATABASE_FILENAME;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Paths
    #[serde(default)]
    pub paths: PathsConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Base directory for notepath data
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Database file; relative to `data_dir` unless absolute
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Archive file; relative to `data_dir` unless absolute
    #[serde(default = "default_archive")]
    pub archive: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Don't warn when a file uses the same notepath more than once
    #[serde(default)]
    pub suppress_duplicate_warnings: bool,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("org", "notepath", "notepath") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".notepath")
    }
}

fn default_database() -> PathBuf {
    PathBuf::from(DATABASE_FILENAME)
}

fn default_archive() -> PathBuf {
    PathBuf::from(ARCHIVE_FILENAME)
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database: default_database(),
            archive: default_archive(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            Config::default()
        };

        if let Ok(path) = std::env::var("NOTEPATH_DATABASE_PATH") {
            config.paths.database = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("NOTEPATH_ARCHIVE_PATH") {
            config.paths.archive = PathBuf::from(path);
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("NOTEPATH_CONFIG") {
            PathBuf::from(path)
        } else {
            default_data_dir().join("config.toml")
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.paths.data_dir.join(&self.paths.database)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.paths.data_dir.join(&self.paths.archive)
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.paths.data_dir)
            .context("Failed to create data directory")?;
        for file in [self.database_path(), self.archive_path()] {
            if let Some(parent) = file.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
        }
        Ok(())
    }
}
