// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cloud collaborator contract
//!
//! The engine only talks to the cloud through [`CloudAdapter`]. Blocking
//! operations (`power_off`, `power_on`) return once the server reports the
//! requested power state or fail with [`CloudError::Timeout`].

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{server_info, CloudCall, FakeCloudAdapter};

use async_trait::async_trait;
use pm_core::{Plan, ResourceId, ServerInfo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Remote operations, used for error reporting, tracing and fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloudOp {
    ResolveResource,
    ResolvePlan,
    PowerOff,
    DisconnectDisks,
    CloneDisk,
    ChangePlan,
    ConnectDisks,
    PowerOn,
    DeleteDisk,
}

impl CloudOp {
    pub fn name(self) -> &'static str {
        match self {
            CloudOp::ResolveResource => "resolve_resource",
            CloudOp::ResolvePlan => "resolve_plan",
            CloudOp::PowerOff => "power_off",
            CloudOp::DisconnectDisks => "disconnect_disks",
            CloudOp::CloneDisk => "clone_disk",
            CloudOp::ChangePlan => "change_plan",
            CloudOp::ConnectDisks => "connect_disks",
            CloudOp::PowerOn => "power_on",
            CloudOp::DeleteDisk => "delete_disk",
        }
    }
}

impl fmt::Display for CloudOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors from cloud operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloudError {
    /// A server, disk or plan does not exist
    #[error("not found: {0}")]
    NotFound(String),
    /// A remote action was rejected or failed
    #[error("{op} failed: {message}")]
    Operation { op: CloudOp, message: String },
    /// Waiting for the remote state to converge took too long
    #[error("{op} timed out after {after:?}")]
    Timeout { op: CloudOp, after: Duration },
}

impl CloudError {
    pub fn operation(op: CloudOp, message: impl Into<String>) -> Self {
        CloudError::Operation {
            op,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound(_))
    }
}

/// One event of a disk copy.
///
/// A copy emits any number of `Progress` events followed by exactly one
/// terminal event (`Completed` or `Failed`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneEvent {
    Progress { migrated_mb: u64 },
    Completed { disk_id: ResourceId, migrated_mb: u64 },
    Failed(CloudError),
}

impl CloneEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CloneEvent::Progress { .. })
    }
}

/// Receiving half of a disk copy.
///
/// Consumers must keep calling [`CloneProgress::next`] until it returns
/// `None`; producers block on a full channel.
#[derive(Debug)]
pub struct CloneProgress {
    rx: mpsc::Receiver<CloneEvent>,
}

impl CloneProgress {
    /// Create a bounded event channel for a copy
    pub fn channel(capacity: usize) -> (mpsc::Sender<CloneEvent>, CloneProgress) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, CloneProgress { rx })
    }

    /// A copy whose events are all known up front
    pub fn from_events(events: Vec<CloneEvent>) -> CloneProgress {
        let (tx, progress) = Self::channel(events.len());
        for event in events {
            // capacity covers every event
            let _ = tx.try_send(event);
        }
        progress
    }

    pub async fn next(&mut self) -> Option<CloneEvent> {
        self.rx.recv().await
    }
}

/// Capability set the migration engine needs from a cloud
#[async_trait]
pub trait CloudAdapter: Clone + Send + Sync + 'static {
    /// Fetch the live state of a server
    async fn resolve_resource(&self, id: ResourceId) -> Result<ServerInfo, CloudError>;

    /// Find the target-generation plan with the same CPU and memory
    async fn resolve_equivalent_plan(&self, cpu: u32, memory_gb: u32)
        -> Result<Plan, CloudError>;

    /// Shut a server down and wait until it reports powered off
    async fn power_off(&self, id: ResourceId) -> Result<(), CloudError>;

    /// Detach every disk currently attached to a server
    async fn disconnect_all_disks(&self, server: ResourceId) -> Result<(), CloudError>;

    /// Start copying a disk; the copy reports through the returned stream
    async fn clone_disk(&self, disk: ResourceId) -> Result<CloneProgress, CloudError>;

    /// Replace a server's plan, returning the server's identity afterwards
    async fn change_plan(&self, server: ResourceId, plan: &Plan)
        -> Result<ResourceId, CloudError>;

    /// Attach disks to a server in the given order
    async fn connect_disks(&self, server: ResourceId, disks: &[ResourceId])
        -> Result<(), CloudError>;

    /// Boot a server and wait until it reports powered on
    async fn power_on(&self, id: ResourceId) -> Result<(), CloudError>;

    /// Delete a disk
    async fn delete_disk(&self, disk: ResourceId) -> Result<(), CloudError>;
}
