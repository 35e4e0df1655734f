// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TOML inventory for the simulated cloud
//!
//! ```toml
//! [settings]
//! power_delay = "200ms"
//!
//! [[plan]]
//! id = 200002004
//! name = "2core-4GB"
//! cpu = 2
//! memory_gb = 4
//! generation = 200
//!
//! [[server]]
//! id = 1001
//! name = "web"
//! power = "up"
//! cpu = 2
//! memory_gb = 4
//!
//! [[disk]]
//! id = 2001
//! name = "web-root"
//! size_mb = 20480
//! server = 1001
//!
//! [[fault]]
//! op = "clone_disk"
//! target = 2001
//! message = "storage unavailable"
//! ```

use crate::cloud::CloudOp;
use pm_core::{Generation, Plan, PowerStatus, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading an inventory
#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to read inventory {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid inventory: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("duplicate resource id {0}")]
    DuplicateId(ResourceId),
    #[error("disk {disk} is attached to unknown server {server}")]
    UnknownServer {
        disk: ResourceId,
        server: ResourceId,
    },
}

/// Timing of the simulated cloud
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimSettings {
    /// Time for a power transition to converge
    #[serde(with = "humantime_serde")]
    pub power_delay: Duration,
    /// Time between two copy progress events
    #[serde(with = "humantime_serde")]
    pub copy_interval: Duration,
    /// Megabytes copied per progress event
    pub copy_chunk_mb: u64,
    /// Upper bound on waiting for a power transition
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            power_delay: Duration::from_millis(200),
            copy_interval: Duration::from_millis(100),
            copy_chunk_mb: 4096,
            timeout: Duration::from_secs(24 * 60 * 60),
            poll_interval: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimServer {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub power: PowerStatus,
    pub cpu: u32,
    pub memory_gb: u32,
    #[serde(default)]
    pub generation: Generation,
}

/// A disk and the attributes a copy carries over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimDisk {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon_id: Option<ResourceId>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_connection")]
    pub connection: String,
    pub size_mb: u64,
    #[serde(default = "default_disk_plan")]
    pub plan: String,
    /// Server the disk is attached to
    #[serde(default)]
    pub server: Option<ResourceId>,
    /// Disk this one was copied from
    #[serde(default)]
    pub source_disk: Option<ResourceId>,
}

fn default_connection() -> String {
    "virtio".to_string()
}

fn default_disk_plan() -> String {
    "ssd".to_string()
}

/// Makes one operation fail; without a target it fails for every resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fault {
    pub op: CloudOp,
    #[serde(default)]
    pub target: Option<ResourceId>,
    pub message: String,
}

impl Fault {
    pub fn matches(&self, op: CloudOp, target: Option<ResourceId>) -> bool {
        self.op == op && (self.target.is_none() || self.target == target)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Inventory {
    #[serde(default)]
    pub settings: SimSettings,
    #[serde(default, rename = "plan")]
    pub plans: Vec<Plan>,
    #[serde(default, rename = "server")]
    pub servers: Vec<SimServer>,
    #[serde(default, rename = "disk")]
    pub disks: Vec<SimDisk>,
    #[serde(default, rename = "fault")]
    pub faults: Vec<Fault>,
}

impl Inventory {
    pub fn from_toml(content: &str) -> Result<Self, SimError> {
        let inventory: Inventory = toml::from_str(content)?;
        inventory.validate()?;
        Ok(inventory)
    }

    pub fn load(path: &Path) -> Result<Self, SimError> {
        let content = std::fs::read_to_string(path).map_err(|source| SimError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    fn validate(&self) -> Result<(), SimError> {
        let mut seen = HashSet::new();
        let ids = self
            .servers
            .iter()
            .map(|s| s.id)
            .chain(self.disks.iter().map(|d| d.id));
        for id in ids {
            if !seen.insert(id) {
                return Err(SimError::DuplicateId(id));
            }
        }
        let servers: HashSet<ResourceId> = self.servers.iter().map(|s| s.id).collect();
        for disk in &self.disks {
            if let Some(server) = disk.server {
                if !servers.contains(&server) {
                    return Err(SimError::UnknownServer {
                        disk: disk.id,
                        server,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod tests;
