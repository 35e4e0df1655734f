// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::cloud::{CloneProgress, CloudAdapter, CloudError, CloudOp};
use async_trait::async_trait;
use pm_core::{Plan, ResourceId, ServerInfo};
use std::future::Future;
use tracing::Instrument;

/// Wrapper that adds tracing to any CloudAdapter
#[derive(Clone)]
pub struct TracedCloudAdapter<C> {
    inner: C,
}

impl<C> TracedCloudAdapter<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

/// Run `call` inside a span named after `op`, logging duration and outcome
async fn traced<T, F>(op: CloudOp, target: Option<ResourceId>, call: F) -> Result<T, CloudError>
where
    F: Future<Output = Result<T, CloudError>>,
{
    let span = tracing::info_span!("cloud", op = op.name(), target = target.map(|t| t.get()));
    async move {
        tracing::debug!("starting");
        let start = std::time::Instant::now();
        let result = call.await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::info!(elapsed_ms, "completed"),
            Err(e) => tracing::error!(elapsed_ms, error = %e, "failed"),
        }
        result
    }
    .instrument(span)
    .await
}

#[async_trait]
impl<C: CloudAdapter> CloudAdapter for TracedCloudAdapter<C> {
    async fn resolve_resource(&self, id: ResourceId) -> Result<ServerInfo, CloudError> {
        traced(
            CloudOp::ResolveResource,
            Some(id),
            self.inner.resolve_resource(id),
        )
        .await
    }

    async fn resolve_equivalent_plan(
        &self,
        cpu: u32,
        memory_gb: u32,
    ) -> Result<Plan, CloudError> {
        let span = tracing::debug_span!("plan_lookup", cpu, memory_gb);
        traced(
            CloudOp::ResolvePlan,
            None,
            self.inner.resolve_equivalent_plan(cpu, memory_gb),
        )
        .instrument(span)
        .await
    }

    async fn power_off(&self, id: ResourceId) -> Result<(), CloudError> {
        traced(CloudOp::PowerOff, Some(id), self.inner.power_off(id)).await
    }

    async fn disconnect_all_disks(&self, server: ResourceId) -> Result<(), CloudError> {
        traced(
            CloudOp::DisconnectDisks,
            Some(server),
            self.inner.disconnect_all_disks(server),
        )
        .await
    }

    async fn clone_disk(&self, disk: ResourceId) -> Result<CloneProgress, CloudError> {
        // Only the request is traced; progress events belong to the consumer
        traced(CloudOp::CloneDisk, Some(disk), self.inner.clone_disk(disk)).await
    }

    async fn change_plan(&self, server: ResourceId, plan: &Plan) -> Result<ResourceId, CloudError> {
        let result = traced(
            CloudOp::ChangePlan,
            Some(server),
            self.inner.change_plan(server, plan),
        )
        .await;
        if let Ok(new_id) = &result {
            tracing::info!(%server, new_id = %new_id, plan = %plan, "plan changed");
        }
        result
    }

    async fn connect_disks(
        &self,
        server: ResourceId,
        disks: &[ResourceId],
    ) -> Result<(), CloudError> {
        tracing::debug!(%server, count = disks.len(), "connecting disks");
        traced(
            CloudOp::ConnectDisks,
            Some(server),
            self.inner.connect_disks(server, disks),
        )
        .await
    }

    async fn power_on(&self, id: ResourceId) -> Result<(), CloudError> {
        traced(CloudOp::PowerOn, Some(id), self.inner.power_on(id)).await
    }

    async fn delete_disk(&self, disk: ResourceId) -> Result<(), CloudError> {
        tracing::warn!(%disk, "deleting disk");
        traced(CloudOp::DeleteDisk, Some(disk), self.inner.delete_disk(disk)).await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
