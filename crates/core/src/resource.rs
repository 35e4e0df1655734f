// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live-state snapshots of servers, disks and plans as reported by the cloud

use crate::id::ResourceId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Plan family of a server. Migration moves servers to [`Generation::G2`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(pub u32);

impl Generation {
    pub const G1: Generation = Generation(100);
    pub const G2: Generation = Generation(200);
}

impl Default for Generation {
    fn default() -> Self {
        Self::G1
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen{}", self.0 / 100)
    }
}

/// Power state of a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerStatus {
    Up,
    #[default]
    Down,
}

impl PowerStatus {
    pub fn is_up(self) -> bool {
        self == PowerStatus::Up
    }
}

impl fmt::Display for PowerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerStatus::Up => write!(f, "up"),
            PowerStatus::Down => write!(f, "down"),
        }
    }
}

/// A disk attached to a server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskInfo {
    pub id: ResourceId,
    pub name: String,
    pub size_mb: u64,
}

/// Current state of a server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub id: ResourceId,
    pub name: String,
    pub power: PowerStatus,
    pub cpu: u32,
    pub memory_gb: u32,
    pub generation: Generation,
    /// Attached disks in connection order
    pub disks: Vec<DiskInfo>,
}

impl ServerInfo {
    pub fn is_up(&self) -> bool {
        self.power.is_up()
    }
}

/// A server plan (CPU/memory pair within a generation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: ResourceId,
    pub name: String,
    pub cpu: u32,
    pub memory_gb: u32,
    pub generation: Generation,
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} core / {}GB, {})",
            self.name, self.cpu, self.memory_gb, self.generation
        )
    }
}
