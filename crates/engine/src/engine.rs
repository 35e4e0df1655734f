// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Migration engine: build the per-server pipelines, then run them with a
//! bounded number of workers

use crate::error::BuildError;
use crate::pipeline;
use crate::server::ServerMigration;
use pm_adapters::CloudAdapter;
use pm_core::{Clock, MigrateOptions, MigrationLog, ResourceId, SystemClock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

/// Engine collaborators
pub struct EngineDeps<A, C = SystemClock> {
    pub cloud: A,
    pub clock: C,
    /// Step log; `None` disables it
    pub log: Option<Arc<dyn MigrationLog>>,
}

type ActiveSet<C> = Arc<Mutex<Vec<Arc<ServerMigration<C>>>>>;

/// Removes a server from the active set when its task ends, even on panic
struct ActiveGuard<C: Clock> {
    active: ActiveSet<C>,
    server: Arc<ServerMigration<C>>,
}

impl<C: Clock> ActiveGuard<C> {
    fn register(active: ActiveSet<C>, server: Arc<ServerMigration<C>>) -> Self {
        active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::clone(&server));
        Self { active, server }
    }
}

impl<C: Clock> Drop for ActiveGuard<C> {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|s| !Arc::ptr_eq(s, &self.server));
    }
}

/// Runs a fixed set of server migrations
pub struct MigrationEngine<A, C: Clock = SystemClock> {
    cloud: A,
    servers: Vec<Arc<ServerMigration<C>>>,
    active: ActiveSet<C>,
    max_workers: usize,
    applied: AtomicBool,
}

impl<A, C> MigrationEngine<A, C>
where
    A: CloudAdapter,
    C: Clock,
{
    /// Resolve every server and its replacement plan.
    ///
    /// Any lookup failure aborts the whole build; nothing has run yet.
    pub async fn build(
        deps: EngineDeps<A, C>,
        ids: &[ResourceId],
        options: &MigrateOptions,
    ) -> Result<Self, BuildError> {
        let mut servers = Vec::with_capacity(ids.len());
        for &id in ids {
            let info = deps
                .cloud
                .resolve_resource(id)
                .await
                .map_err(|source| BuildError::Lookup { id, source })?;
            let plan = deps
                .cloud
                .resolve_equivalent_plan(info.cpu, info.memory_gb)
                .await
                .map_err(|source| BuildError::Lookup { id, source })?;
            tracing::debug!(
                server = %id,
                name = %info.name,
                power = %info.power,
                disks = info.disks.len(),
                plan = %plan,
                "server resolved"
            );
            servers.push(Arc::new(ServerMigration::new(
                &info,
                plan,
                options,
                deps.clock.clone(),
                deps.log.clone(),
            )));
        }

        Ok(Self {
            cloud: deps.cloud,
            servers,
            active: Arc::new(Mutex::new(Vec::new())),
            max_workers: options.max_workers.max(1),
            applied: AtomicBool::new(false),
        })
    }

    /// Every server, in request order
    pub fn servers(&self) -> &[Arc<ServerMigration<C>>] {
        &self.servers
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run every server's pipeline and wait for all of them.
    ///
    /// Failures stay on their server; inspect [`MigrationEngine::has_errors`]
    /// afterwards. The engine runs once; later calls return immediately.
    pub async fn apply(&self) {
        if self.applied.swap(true, Ordering::AcqRel) {
            tracing::warn!("migration already applied");
            return;
        }

        let permits = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();
        for server in &self.servers {
            let server = Arc::clone(server);
            let cloud = self.cloud.clone();
            let permits = Arc::clone(&permits);
            let active = Arc::clone(&self.active);
            let span = tracing::info_span!(
                "server",
                id = %server.target_id(),
                name = %server.name()
            );
            tasks.spawn(
                async move {
                    let Ok(_permit) = permits.acquire_owned().await else {
                        return;
                    };
                    let _guard = ActiveGuard::register(active, Arc::clone(&server));
                    pipeline::run(&server, &cloud).await;
                }
                .instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                tracing::error!(error = %err, "server task failed");
            }
        }
        tracing::info!(
            servers = self.servers.len(),
            failed = self.has_errors().len(),
            "apply finished"
        );
    }

    /// Snapshot of the servers currently running
    pub fn working(&self) -> Vec<Arc<ServerMigration<C>>> {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Servers whose pipeline has stopped on an error
    pub fn has_errors(&self) -> Vec<Arc<ServerMigration<C>>> {
        self.servers
            .iter()
            .filter(|s| s.has_error())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
