// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake cloud adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{CloneEvent, CloneProgress, CloudAdapter, CloudError, CloudOp};
use async_trait::async_trait;
use pm_core::{DiskInfo, Generation, Plan, PowerStatus, ResourceId, ServerInfo};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// First identity handed out for cloned disks and migrated servers
const FIRST_ISSUED_ID: u64 = 900_000;

/// Recorded cloud call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudCall {
    ResolveResource { id: ResourceId },
    ResolvePlan { cpu: u32, memory_gb: u32 },
    PowerOff { id: ResourceId },
    DisconnectDisks { server: ResourceId },
    CloneDisk { disk: ResourceId },
    ChangePlan { server: ResourceId, plan: ResourceId },
    ConnectDisks { server: ResourceId, disks: Vec<ResourceId> },
    PowerOn { id: ResourceId },
    DeleteDisk { disk: ResourceId },
}

#[derive(Default)]
struct FakeState {
    servers: HashMap<ResourceId, ServerInfo>,
    plans: Vec<Plan>,
    /// Keyed by target; `None` matches every target
    failures: HashMap<(CloudOp, Option<ResourceId>), CloudError>,
    clone_progress: HashMap<ResourceId, Vec<u64>>,
    latency: Duration,
    next_id: u64,
    in_flight: usize,
    peak_in_flight: usize,
    clones_started: usize,
    clones_drained: usize,
}

impl FakeState {
    fn failure(&self, op: CloudOp, target: Option<ResourceId>) -> Option<CloudError> {
        target
            .and_then(|id| self.failures.get(&(op, Some(id))))
            .or_else(|| self.failures.get(&(op, None)))
            .cloned()
    }

    fn issue_id(&mut self) -> ResourceId {
        self.next_id += 1;
        ResourceId(FIRST_ISSUED_ID + self.next_id)
    }

    fn disk_size(&self, disk: ResourceId) -> Option<u64> {
        self.servers
            .values()
            .flat_map(|s| s.disks.iter())
            .find(|d| d.id == disk)
            .map(|d| d.size_mb)
    }
}

/// Fake cloud adapter for testing
#[derive(Clone, Default)]
pub struct FakeCloudAdapter {
    state: Arc<Mutex<FakeState>>,
    calls: Arc<Mutex<Vec<CloudCall>>>,
}

/// Build a generation-1 server with 2 cores, 4GB and 20GB disks
pub fn server_info(id: u64, power: PowerStatus, disks: &[u64]) -> ServerInfo {
    ServerInfo {
        id: ResourceId(id),
        name: format!("server-{}", id),
        power,
        cpu: 2,
        memory_gb: 4,
        generation: Generation::G1,
        disks: disks
            .iter()
            .map(|&d| DiskInfo {
                id: ResourceId(d),
                name: format!("disk-{}", d),
                size_mb: 20 * 1024,
            })
            .collect(),
    }
}

impl FakeCloudAdapter {
    /// A fake that knows the generation-2 plan for 2 cores / 4GB
    pub fn new() -> Self {
        let fake = Self::default();
        fake.add_plan(Plan {
            id: ResourceId(200_002_004),
            name: "2core-4GB".to_string(),
            cpu: 2,
            memory_gb: 4,
            generation: Generation::G2,
        });
        fake
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: CloudCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    pub fn add_server(&self, server: ServerInfo) {
        self.lock().servers.insert(server.id, server);
    }

    pub fn add_plan(&self, plan: Plan) {
        self.lock().plans.push(plan);
    }

    /// Make `op` fail with `error` for `target` (or every target when `None`)
    pub fn fail(&self, op: CloudOp, target: Option<ResourceId>, error: CloudError) {
        self.lock().failures.insert((op, target), error);
    }

    /// Make `op` fail with an operation error for one target
    pub fn fail_on(&self, op: CloudOp, target: ResourceId, message: &str) {
        self.fail(op, Some(target), CloudError::operation(op, message));
    }

    /// Delay every mutating call
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Progress values reported before a disk's copy completes
    pub fn set_clone_progress(&self, disk: ResourceId, steps: Vec<u64>) {
        self.lock().clone_progress.insert(disk, steps);
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<CloudCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Calls made against one server or disk
    pub fn calls_for(&self, target: ResourceId) -> Vec<CloudCall> {
        self.calls()
            .into_iter()
            .filter(|call| match call {
                CloudCall::ResolveResource { id }
                | CloudCall::PowerOff { id }
                | CloudCall::PowerOn { id } => *id == target,
                CloudCall::DisconnectDisks { server }
                | CloudCall::ChangePlan { server, .. }
                | CloudCall::ConnectDisks { server, .. } => *server == target,
                CloudCall::CloneDisk { disk } | CloudCall::DeleteDisk { disk } => *disk == target,
                CloudCall::ResolvePlan { .. } => false,
            })
            .collect()
    }

    pub fn server(&self, id: ResourceId) -> Option<ServerInfo> {
        self.lock().servers.get(&id).cloned()
    }

    /// Highest number of calls observed in flight at once
    pub fn peak_in_flight(&self) -> usize {
        self.lock().peak_in_flight
    }

    /// (copies started, copies whose every event was taken by the consumer)
    pub fn clone_streams(&self) -> (usize, usize) {
        let state = self.lock();
        (state.clones_started, state.clones_drained)
    }

    async fn perform(&self, op: CloudOp, target: Option<ResourceId>) -> Result<(), CloudError> {
        let latency = {
            let mut state = self.lock();
            state.in_flight += 1;
            state.peak_in_flight = state.peak_in_flight.max(state.in_flight);
            state.latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let mut state = self.lock();
        state.in_flight -= 1;
        match state.failure(op, target) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn set_power(&self, id: ResourceId, power: PowerStatus) {
        if let Some(server) = self.lock().servers.get_mut(&id) {
            server.power = power;
        }
    }
}

#[async_trait]
impl CloudAdapter for FakeCloudAdapter {
    async fn resolve_resource(&self, id: ResourceId) -> Result<ServerInfo, CloudError> {
        self.record(CloudCall::ResolveResource { id });
        let state = self.lock();
        if let Some(err) = state.failure(CloudOp::ResolveResource, Some(id)) {
            return Err(err);
        }
        state
            .servers
            .get(&id)
            .cloned()
            .ok_or_else(|| CloudError::NotFound(format!("server {}", id)))
    }

    async fn resolve_equivalent_plan(
        &self,
        cpu: u32,
        memory_gb: u32,
    ) -> Result<Plan, CloudError> {
        self.record(CloudCall::ResolvePlan { cpu, memory_gb });
        let state = self.lock();
        if let Some(err) = state.failure(CloudOp::ResolvePlan, None) {
            return Err(err);
        }
        state
            .plans
            .iter()
            .find(|p| p.cpu == cpu && p.memory_gb == memory_gb && p.generation == Generation::G2)
            .cloned()
            .ok_or_else(|| {
                CloudError::NotFound(format!("plan with {} core / {}GB", cpu, memory_gb))
            })
    }

    async fn power_off(&self, id: ResourceId) -> Result<(), CloudError> {
        self.record(CloudCall::PowerOff { id });
        self.perform(CloudOp::PowerOff, Some(id)).await?;
        self.set_power(id, PowerStatus::Down);
        Ok(())
    }

    async fn disconnect_all_disks(&self, server: ResourceId) -> Result<(), CloudError> {
        self.record(CloudCall::DisconnectDisks { server });
        self.perform(CloudOp::DisconnectDisks, Some(server)).await
    }

    async fn clone_disk(&self, disk: ResourceId) -> Result<CloneProgress, CloudError> {
        self.record(CloudCall::CloneDisk { disk });
        let size_mb = self
            .lock()
            .disk_size(disk)
            .ok_or_else(|| CloudError::NotFound(format!("disk {}", disk)))?;
        let outcome = self.perform(CloudOp::CloneDisk, Some(disk)).await;

        let mut state = self.lock();
        let steps = state
            .clone_progress
            .get(&disk)
            .cloned()
            .unwrap_or_else(|| vec![size_mb / 2]);
        let mut events: Vec<CloneEvent> = steps
            .into_iter()
            .map(|migrated_mb| CloneEvent::Progress { migrated_mb })
            .collect();
        events.push(match outcome {
            Ok(()) => CloneEvent::Completed {
                disk_id: state.issue_id(),
                migrated_mb: size_mb,
            },
            Err(err) => CloneEvent::Failed(err),
        });
        state.clones_started += 1;
        drop(state);

        // A one-slot channel blocks the producer until the consumer reads
        let (tx, progress) = CloneProgress::channel(1);
        let shared = Arc::clone(&self.state);
        tokio::spawn(async move {
            for event in events {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
            shared
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clones_drained += 1;
        });
        Ok(progress)
    }

    async fn change_plan(&self, server: ResourceId, plan: &Plan) -> Result<ResourceId, CloudError> {
        self.record(CloudCall::ChangePlan {
            server,
            plan: plan.id,
        });
        self.perform(CloudOp::ChangePlan, Some(server)).await?;

        let mut state = self.lock();
        let mut info = state
            .servers
            .remove(&server)
            .ok_or_else(|| CloudError::NotFound(format!("server {}", server)))?;
        let new_id = state.issue_id();
        info.id = new_id;
        info.generation = plan.generation;
        info.cpu = plan.cpu;
        info.memory_gb = plan.memory_gb;
        state.servers.insert(new_id, info);
        Ok(new_id)
    }

    async fn connect_disks(
        &self,
        server: ResourceId,
        disks: &[ResourceId],
    ) -> Result<(), CloudError> {
        self.record(CloudCall::ConnectDisks {
            server,
            disks: disks.to_vec(),
        });
        self.perform(CloudOp::ConnectDisks, Some(server)).await
    }

    async fn power_on(&self, id: ResourceId) -> Result<(), CloudError> {
        self.record(CloudCall::PowerOn { id });
        self.perform(CloudOp::PowerOn, Some(id)).await?;
        self.set_power(id, PowerStatus::Up);
        Ok(())
    }

    async fn delete_disk(&self, disk: ResourceId) -> Result<(), CloudError> {
        self.record(CloudCall::DeleteDisk { disk });
        self.perform(CloudOp::DeleteDisk, Some(disk)).await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
