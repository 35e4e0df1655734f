// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Migration options
//!
//! Options are read from an optional TOML file and then overridden by
//! command-line flags:
//!
//! ```toml
//! disable_boot = false
//! delete_disks = true
//! max_workers = 4
//! refresh_interval = "500ms"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default number of servers migrated at the same time
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Default interval between status refreshes
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Errors from loading or validating options
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("max_workers must be at least 1")]
    NoWorkers,
    #[error("refresh_interval must be greater than zero")]
    ZeroRefresh,
}

/// How a migration run treats each server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrateOptions {
    /// Leave servers powered off after the plan change
    pub disable_boot: bool,
    /// Delete the original disks once the clones are connected
    pub delete_disks: bool,
    /// Maximum number of server pipelines running concurrently
    pub max_workers: usize,
    /// How often the live status is refreshed
    #[serde(with = "humantime_serde")]
    pub refresh_interval: Duration,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        Self {
            disable_boot: false,
            delete_disks: false,
            max_workers: DEFAULT_MAX_WORKERS,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl MigrateOptions {
    /// Parse options from TOML and validate them
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let options: MigrateOptions = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.refresh_interval.is_zero() {
            return Err(ConfigError::ZeroRefresh);
        }
        Ok(())
    }

    pub fn with_disable_boot(mut self, disable_boot: bool) -> Self {
        self.disable_boot = disable_boot;
        self
    }

    pub fn with_delete_disks(mut self, delete_disks: bool) -> Self {
        self.delete_disks = delete_disks;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
