// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-server migration state

use crate::disk::DiskMigration;
use pm_adapters::CloudError;
use pm_core::{Clock, MigrateOptions, MigrationLog, Plan, ResourceId, ServerInfo, Step, SystemClock};
use std::sync::{Arc, Mutex, OnceLock};

/// One row of the live status table. A server renders one row per disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub server: String,
    pub shutdown: String,
    pub disk: String,
    pub plan_change: String,
    pub boot: String,
    pub cleanup: String,
}

impl StatusRow {
    pub const HEADERS: [&'static str; 6] =
        ["Server", "Shutdown", "Disk", "PlanChange", "Boot", "Cleanup"];

    pub fn cells(&self) -> [&str; 6] {
        [
            &self.server,
            &self.shutdown,
            &self.disk,
            &self.plan_change,
            &self.boot,
            &self.cleanup,
        ]
    }
}

/// Pipeline state for one server.
///
/// Step enablement is fixed here from the live state observed at build time
/// and never re-evaluated.
pub struct ServerMigration<C: Clock = SystemClock> {
    target_id: ResourceId,
    name: String,
    plan: Plan,
    /// Identity after the plan change
    migrated_id: Mutex<Option<ResourceId>>,
    disks: Vec<DiskMigration<C>>,
    shutdown: Step<C>,
    disconnect: Step<C>,
    change_plan: Step<C>,
    connect: Step<C>,
    boot: Step<C>,
    error: OnceLock<CloudError>,
}

impl<C: Clock> ServerMigration<C> {
    pub fn new(
        server: &ServerInfo,
        plan: Plan,
        options: &MigrateOptions,
        clock: C,
        log: Option<Arc<dyn MigrationLog>>,
    ) -> Self {
        let prefix = format!(": Server[{}:{}] :", server.id, server.name);
        let has_disks = !server.disks.is_empty();
        let step = |stage: &str, enabled: bool| {
            Step::new(
                format!("{} {}", prefix, stage),
                enabled,
                clock.clone(),
                log.clone(),
            )
        };

        Self {
            target_id: server.id,
            name: server.name.clone(),
            plan,
            migrated_id: Mutex::new(None),
            disks: server
                .disks
                .iter()
                .map(|disk| {
                    DiskMigration::new(
                        disk,
                        &server.name,
                        options.delete_disks,
                        clock.clone(),
                        log.clone(),
                    )
                })
                .collect(),
            shutdown: step("Shutdown Server", server.is_up()),
            disconnect: step("Disconnect Disk", has_disks),
            change_plan: step("Migrate Server Plan", true),
            connect: step("Connect Disk", has_disks),
            boot: step("Boot Server", !options.disable_boot),
            error: OnceLock::new(),
        }
    }

    pub fn target_id(&self) -> ResourceId {
        self.target_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The target-generation plan this server moves to
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Identity after the plan change, once it has happened
    pub fn migrated_id(&self) -> Option<ResourceId> {
        *self.migrated_id.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn set_migrated_id(&self, id: ResourceId) {
        *self.migrated_id.lock().unwrap_or_else(|e| e.into_inner()) = Some(id);
    }

    pub fn disks(&self) -> &[DiskMigration<C>] {
        &self.disks
    }

    pub fn shutdown_step(&self) -> &Step<C> {
        &self.shutdown
    }

    pub fn disconnect_step(&self) -> &Step<C> {
        &self.disconnect
    }

    pub fn change_plan_step(&self) -> &Step<C> {
        &self.change_plan
    }

    pub fn connect_step(&self) -> &Step<C> {
        &self.connect
    }

    pub fn boot_step(&self) -> &Step<C> {
        &self.boot
    }

    /// The first failure of this server's pipeline
    pub fn error(&self) -> Option<&CloudError> {
        self.error.get()
    }

    pub fn has_error(&self) -> bool {
        self.error.get().is_some()
    }

    /// Record the pipeline's terminal error. Later failures are ignored.
    pub(crate) fn fail(&self, err: CloudError) {
        let message = err.to_string();
        if self.error.set(err).is_ok() {
            tracing::error!(
                server = %self.target_id,
                name = %self.name,
                error = %message,
                "migration failed"
            );
        }
    }

    /// Cloned disk identities in source disk order
    pub fn cloned_disk_ids(&self) -> Vec<ResourceId> {
        self.disks.iter().map(|d| d.cloned_id()).collect()
    }

    pub fn status_rows(&self) -> Vec<StatusRow> {
        let shutdown = self.shutdown.status().to_string();
        let plan_change = self.change_plan.status().to_string();
        let boot = self.boot.status().to_string();
        self.disks
            .iter()
            .map(|disk| StatusRow {
                server: self.target_id.to_string(),
                shutdown: shutdown.clone(),
                disk: disk.clone_status(),
                plan_change: plan_change.clone(),
                boot: boot.clone(),
                cleanup: disk.delete_status(),
            })
            .collect()
    }
}

impl<C: Clock> std::fmt::Debug for ServerMigration<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerMigration")
            .field("target_id", &self.target_id)
            .field("name", &self.name)
            .field("migrated_id", &self.migrated_id())
            .field("error", &self.error.get())
            .finish()
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
