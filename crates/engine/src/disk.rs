// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-disk clone and delete sub-pipeline

use pm_adapters::{CloneEvent, CloneProgress, CloudAdapter, CloudError, CloudOp};
use pm_core::{Clock, DiskInfo, MigrationLog, ResourceId, Step, StepState, SystemClock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Clone and delete tracking for one source disk
pub struct DiskMigration<C: Clock = SystemClock> {
    original_id: ResourceId,
    size_mb: u64,
    /// Zero until the clone succeeds
    cloned_id: AtomicU64,
    migrated_mb: AtomicU64,
    clone_step: Step<C>,
    delete_step: Step<C>,
}

impl<C: Clock> DiskMigration<C> {
    pub fn new(
        disk: &DiskInfo,
        server_name: &str,
        delete_enabled: bool,
        clock: C,
        log: Option<Arc<dyn MigrationLog>>,
    ) -> Self {
        let prefix = format!(":   Disk[{}:{}] :", disk.id, server_name);
        Self {
            original_id: disk.id,
            size_mb: disk.size_mb,
            cloned_id: AtomicU64::new(0),
            migrated_mb: AtomicU64::new(0),
            clone_step: Step::new(
                format!("{} Clone Disk", prefix),
                true,
                clock.clone(),
                log.clone(),
            ),
            delete_step: Step::new(format!("{} Delete Disk", prefix), delete_enabled, clock, log),
        }
    }

    pub fn original_id(&self) -> ResourceId {
        self.original_id
    }

    pub fn size_mb(&self) -> u64 {
        self.size_mb
    }

    /// Identity of the copy; [`ResourceId::UNSET`] until the clone succeeds
    pub fn cloned_id(&self) -> ResourceId {
        ResourceId(self.cloned_id.load(Ordering::Acquire))
    }

    pub fn migrated_mb(&self) -> u64 {
        self.migrated_mb.load(Ordering::Acquire)
    }

    pub fn clone_step(&self) -> &Step<C> {
        &self.clone_step
    }

    pub fn delete_step(&self) -> &Step<C> {
        &self.delete_step
    }

    /// Clone column of the status table
    pub fn clone_status(&self) -> String {
        if self.clone_step.state() == StepState::Error {
            return "error".to_string();
        }
        if !self.clone_step.is_started() {
            return self.clone_step.status().to_string();
        }
        if self.clone_step.is_done() {
            return format!("{}(cloned)", self.cloned_id());
        }
        format!(
            "{}({}s)\n{}MB/{}MB",
            self.original_id,
            self.clone_step.elapsed().as_secs(),
            self.migrated_mb(),
            self.size_mb
        )
    }

    /// Cleanup column of the status table
    pub fn delete_status(&self) -> String {
        self.delete_step.status().to_string()
    }

    /// Copy the disk, draining the progress stream to its end
    pub(crate) async fn run_clone<A: CloudAdapter>(
        &self,
        cloud: &A,
    ) -> Result<ResourceId, CloudError> {
        self.clone_step.start();
        let result = match cloud.clone_disk(self.original_id).await {
            Ok(progress) => self.drain(progress).await,
            Err(err) => Err(err),
        };
        match &result {
            Ok(cloned) => {
                self.cloned_id.store(cloned.get(), Ordering::Release);
                self.clone_step.finalize();
            }
            Err(err) => self.clone_step.set_error(err),
        }
        result
    }

    async fn drain(&self, mut progress: CloneProgress) -> Result<ResourceId, CloudError> {
        let mut outcome = None;
        while let Some(event) = progress.next().await {
            match event {
                CloneEvent::Progress { migrated_mb } => self.record_progress(migrated_mb),
                CloneEvent::Completed {
                    disk_id,
                    migrated_mb,
                } => {
                    self.record_progress(migrated_mb);
                    outcome.get_or_insert(Ok(disk_id));
                }
                CloneEvent::Failed(err) => {
                    outcome.get_or_insert(Err(err));
                }
            }
        }
        outcome.unwrap_or_else(|| {
            Err(CloudError::operation(
                CloudOp::CloneDisk,
                "copy ended without a result",
            ))
        })
    }

    fn record_progress(&self, migrated_mb: u64) {
        self.migrated_mb.fetch_max(migrated_mb, Ordering::AcqRel);
    }

    /// Delete the original disk
    pub(crate) async fn run_delete<A: CloudAdapter>(&self, cloud: &A) -> Result<(), CloudError> {
        if !self.delete_step.is_enabled() {
            return Ok(());
        }
        self.delete_step.start();
        match cloud.delete_disk(self.original_id).await {
            Ok(()) => {
                self.delete_step.finalize();
                Ok(())
            }
            Err(err) => {
                self.delete_step.set_error(&err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "disk_tests.rs"]
mod tests;
