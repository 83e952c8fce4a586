//! Tool configuration file handling
//!
//! This is the per-user `config.toml`, separate from the service's
//! `serverless.yml` (see [`crate::service`]).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Test runner executables, keyed by framework id ("mocha", "jest")
    #[serde(default)]
    pub runners: HashMap<String, RunnerConfig>,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// Configuration for a test runner executable
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Path to the runner executable
    pub path: PathBuf,

    /// Additional arguments placed before the generated ones
    #[serde(default)]
    pub args: Vec<String>,
}

/// Timeout settings
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Per-test timeout handed to the runner
    #[serde(default = "default_test_timeout")]
    pub test_timeout_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            test_timeout_ms: default_test_timeout(),
        }
    }
}

fn default_test_timeout() -> u64 {
    6000
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Find the executable for a test runner
    ///
    /// Order: explicit configuration, the service's `node_modules/.bin`,
    /// then `PATH`.
    pub fn runner_command(&self, binary: &str, service_dir: &Path) -> Result<RunnerConfig> {
        if let Some(config) = self.runners.get(binary) {
            return Ok(config.clone());
        }

        let local = local_bin_path(service_dir, binary);
        if local.exists() {
            return Ok(RunnerConfig {
                path: local,
                args: Vec::new(),
            });
        }

        which::which(binary)
            .map(|path| RunnerConfig {
                path,
                args: Vec::new(),
            })
            .map_err(|_| {
                Error::runner_not_found(
                    binary,
                    &[local.display().to_string(), "PATH".to_string()],
                )
            })
    }
}

fn local_bin_path(service_dir: &Path, binary: &str) -> PathBuf {
    let bin_dir = service_dir.join("node_modules").join(".bin");
    if cfg!(windows) {
        bin_dir.join(format!("{binary}.cmd"))
    } else {
        bin_dir.join(binary)
    }
}
