// src/config/settings.rs
//! Runtime configuration settings.
//!
//! This module contains the command line structures and the optional JSON
//! settings file, plus the merge and validation logic between the two.

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::config::constants::{MAX_CONNECT_TIMEOUT_SECS, MIN_CONNECT_TIMEOUT_SECS, PASSWORD_ENV};
use crate::config::defaults;
use crate::types::SessionSlot;

/// Error type for configuration-related operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Command line arguments for the runner
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "remote-runner",
    about = "Run typo-tolerant commands on a remote host over SSH",
    version,
    author
)]
pub struct ClientArgs {
    /// Log level (RUST_LOG takes precedence)
    #[clap(long, global = true)]
    pub log_level: Option<String>,

    /// Also write logs to a daily-rolling file at this path
    #[clap(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// JSON settings file
    #[clap(long, global = true)]
    pub config_file: Option<PathBuf>,

    /// Print results as JSON
    #[clap(long, global = true)]
    pub json: bool,

    #[clap(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Open a session, report the host key fingerprint, and close it
    Connect {
        #[clap(flatten)]
        target: TargetArgs,
    },

    /// Connect, run one command or catalog entry, and disconnect
    Run {
        #[clap(flatten)]
        target: TargetArgs,

        /// Workflow slot; the docker slot auto-corrects and accepts catalog labels
        #[clap(long, value_enum, default_value = "docker")]
        slot: SessionSlot,

        /// Argument for catalog entries that need one
        #[clap(long = "arg")]
        argument: Option<String>,

        /// Command line or catalog label
        command: String,
    },

    /// List the command catalog
    Catalog,

    /// Show how a command would be auto-corrected, without connecting
    Normalize {
        /// Command line to normalize
        command: String,
    },

    /// Interactive console holding both session slots
    Console,
}

/// Connection target flags
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Remote host name or address
    #[clap(long)]
    pub host: String,

    /// Remote username
    #[clap(long, short)]
    pub user: Option<String>,

    /// Password; prompted for when absent
    #[clap(long, env = PASSWORD_ENV, hide_env_values = true)]
    pub password: Option<String>,

    /// Connect timeout in seconds
    #[clap(long)]
    pub timeout: Option<u64>,
}

/// Settings merged from the JSON file and the command line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Username used when none is given
    pub default_username: String,
    /// Log level
    pub log_level: String,
    /// Optional log file
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: defaults::DEFAULT_CONNECT_TIMEOUT,
            default_username: defaults::DEFAULT_USERNAME.to_string(),
            log_level: defaults::DEFAULT_LOG_LEVEL.to_string(),
            log_file: None,
        }
    }
}

impl Settings {
    /// Build settings from command line arguments, layering them over the
    /// settings file when one is given
    pub fn from_args(args: &ClientArgs) -> Result<Self, ConfigError> {
        let mut settings = match &args.config_file {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };

        if let Some(level) = &args.log_level {
            settings.log_level = level.clone();
        }
        if let Some(file) = &args.log_file {
            settings.log_file = Some(file.clone());
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::validate_timeout(self.connect_timeout_secs)?;

        if self.default_username.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "default_username must not be empty".to_string(),
            ));
        }

        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log_level must not be empty".to_string()));
        }

        Ok(())
    }

    fn validate_timeout(seconds: u64) -> Result<(), ConfigError> {
        if !(MIN_CONNECT_TIMEOUT_SECS..=MAX_CONNECT_TIMEOUT_SECS).contains(&seconds) {
            return Err(ConfigError::Invalid(format!(
                "Connect timeout must be between {} and {} seconds, got {}",
                MIN_CONNECT_TIMEOUT_SECS, MAX_CONNECT_TIMEOUT_SECS, seconds
            )));
        }
        Ok(())
    }

    /// Timeout for a target, falling back to the configured default
    pub fn timeout_for(&self, target: &TargetArgs) -> Result<Duration, ConfigError> {
        let seconds = target.timeout.unwrap_or(self.connect_timeout_secs);
        Self::validate_timeout(seconds)?;
        Ok(Duration::from_secs(seconds))
    }

    /// Username for a target, falling back to the configured default
    pub fn username_for(&self, target: &TargetArgs) -> String {
        target
            .user
            .clone()
            .unwrap_or_else(|| self.default_username.clone())
    }
}
