// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The ordered stages of one server's migration.
//!
//! Stages run strictly in sequence. The first failure is recorded on the
//! server and no later stage runs; nothing is rolled back.

use crate::server::ServerMigration;
use pm_adapters::{CloudAdapter, CloudError, CloudOp};
use pm_core::{Clock, Step};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Run every stage for a server, recording the first failure on it
pub(crate) async fn run<A: CloudAdapter, C: Clock>(server: &Arc<ServerMigration<C>>, cloud: &A) {
    match run_stages(server, cloud).await {
        Ok(()) => tracing::info!("migration finished"),
        Err(err) => server.fail(err),
    }
}

async fn run_stages<A: CloudAdapter, C: Clock>(
    server: &Arc<ServerMigration<C>>,
    cloud: &A,
) -> Result<(), CloudError> {
    let target = server.target_id();

    stage(server.shutdown_step(), || cloud.power_off(target)).await?;
    stage(server.disconnect_step(), || cloud.disconnect_all_disks(target)).await?;
    clone_disks(server, cloud).await?;

    let plan = server.plan().clone();
    if let Some(new_id) = stage(server.change_plan_step(), || cloud.change_plan(target, &plan)).await? {
        tracing::info!(new_id = %new_id, plan = %plan, "plan changed");
        server.set_migrated_id(new_id);
    }

    let current = server.migrated_id().unwrap_or(target);
    let cloned = server.cloned_disk_ids();
    stage(server.connect_step(), || cloud.connect_disks(current, &cloned)).await?;
    stage(server.boot_step(), || cloud.power_on(current)).await?;
    delete_disks(server, cloud).await
}

/// Run one stage under its step. Disabled steps skip the operation.
async fn stage<C, T, F, Fut>(step: &Step<C>, op: F) -> Result<Option<T>, CloudError>
where
    C: Clock,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, CloudError>>,
{
    if !step.is_enabled() {
        return Ok(None);
    }
    step.start();
    match op().await {
        Ok(value) => {
            step.finalize();
            Ok(Some(value))
        }
        Err(err) => {
            step.set_error(&err);
            Err(err)
        }
    }
}

/// Clone every disk concurrently and wait for all of them.
///
/// Each copy is drained to its terminal event even after a sibling fails;
/// the first failure to arrive becomes the stage's error.
async fn clone_disks<A: CloudAdapter, C: Clock>(
    server: &Arc<ServerMigration<C>>,
    cloud: &A,
) -> Result<(), CloudError> {
    let mut clones = JoinSet::new();
    for index in 0..server.disks().len() {
        let server = Arc::clone(server);
        let cloud = cloud.clone();
        clones.spawn(async move { server.disks()[index].run_clone(&cloud).await });
    }

    let mut first_error = None;
    while let Some(joined) = clones.join_next().await {
        let result = joined.unwrap_or_else(|e| {
            Err(CloudError::operation(
                CloudOp::CloneDisk,
                format!("clone task failed: {}", e),
            ))
        });
        if let Err(err) = result {
            first_error.get_or_insert(err);
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Delete originals one at a time, stopping at the first failure
async fn delete_disks<A: CloudAdapter, C: Clock>(
    server: &ServerMigration<C>,
    cloud: &A,
) -> Result<(), CloudError> {
    for disk in server.disks() {
        disk.run_delete(cloud).await?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
