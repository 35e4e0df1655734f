// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory simulated cloud
//!
//! State lives behind one mutex. Power transitions converge `power_delay`
//! after they are requested; copies stream progress from a spawned task.

mod inventory;

pub use inventory::{Fault, Inventory, SimDisk, SimError, SimServer, SimSettings};

use crate::cloud::{CloneEvent, CloneProgress, CloudAdapter, CloudError, CloudOp};
use async_trait::async_trait;
use pm_core::{DiskInfo, Generation, Plan, PowerStatus, ResourceId, ServerInfo};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::Instant;

struct PendingPower {
    target: PowerStatus,
    ready_at: Instant,
}

struct ServerState {
    spec: SimServer,
    power: PowerStatus,
    pending: Option<PendingPower>,
    /// Attached disks in connection order
    disks: Vec<ResourceId>,
}

impl ServerState {
    fn power_now(&mut self, now: Instant) -> PowerStatus {
        if let Some(pending) = &self.pending {
            if now >= pending.ready_at {
                self.power = pending.target;
                self.pending = None;
            }
        }
        self.power
    }
}

struct SimState {
    plans: Vec<Plan>,
    servers: BTreeMap<ResourceId, ServerState>,
    disks: BTreeMap<ResourceId, SimDisk>,
    faults: Vec<Fault>,
    next_id: u64,
}

impl SimState {
    fn from_inventory(inventory: Inventory) -> Self {
        let next_id = inventory
            .servers
            .iter()
            .map(|s| s.id.get())
            .chain(inventory.disks.iter().map(|d| d.id.get()))
            .chain(inventory.plans.iter().map(|p| p.id.get()))
            .max()
            .unwrap_or(0)
            + 1;

        let mut servers: BTreeMap<ResourceId, ServerState> = inventory
            .servers
            .into_iter()
            .map(|spec| {
                let state = ServerState {
                    power: spec.power,
                    pending: None,
                    disks: Vec::new(),
                    spec,
                };
                (state.spec.id, state)
            })
            .collect();
        for disk in &inventory.disks {
            if let Some(server) = disk.server.and_then(|id| servers.get_mut(&id)) {
                server.disks.push(disk.id);
            }
        }

        Self {
            plans: inventory.plans,
            servers,
            disks: inventory.disks.into_iter().map(|d| (d.id, d)).collect(),
            faults: inventory.faults,
            next_id,
        }
    }

    fn check_fault(&self, op: CloudOp, target: Option<ResourceId>) -> Result<(), CloudError> {
        match self.faults.iter().find(|f| f.matches(op, target)) {
            Some(fault) => Err(CloudError::operation(op, fault.message.clone())),
            None => Ok(()),
        }
    }

    fn issue_id(&mut self) -> ResourceId {
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        id
    }

    fn server_mut(&mut self, id: ResourceId) -> Result<&mut ServerState, CloudError> {
        self.servers
            .get_mut(&id)
            .ok_or_else(|| CloudError::NotFound(format!("server {}", id)))
    }

    fn disk(&self, id: ResourceId) -> Result<&SimDisk, CloudError> {
        self.disks
            .get(&id)
            .ok_or_else(|| CloudError::NotFound(format!("disk {}", id)))
    }

    fn server_info(&mut self, id: ResourceId, now: Instant) -> Result<ServerInfo, CloudError> {
        let server = self.server_mut(id)?;
        let power = server.power_now(now);
        let spec = server.spec.clone();
        let disk_ids = server.disks.clone();
        let disks = disk_ids
            .iter()
            .filter_map(|d| self.disks.get(d))
            .map(|d| DiskInfo {
                id: d.id,
                name: d.name.clone(),
                size_mb: d.size_mb,
            })
            .collect();
        Ok(ServerInfo {
            id: spec.id,
            name: spec.name,
            power,
            cpu: spec.cpu,
            memory_gb: spec.memory_gb,
            generation: spec.generation,
            disks,
        })
    }
}

/// Simulated cloud backed by an [`Inventory`]
#[derive(Clone)]
pub struct SimCloudAdapter {
    state: Arc<Mutex<SimState>>,
    settings: SimSettings,
}

impl SimCloudAdapter {
    pub fn new(inventory: Inventory) -> Self {
        let settings = inventory.settings.clone();
        Self {
            state: Arc::new(Mutex::new(SimState::from_inventory(inventory))),
            settings,
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, SimError> {
        Inventory::from_toml(content).map(Self::new)
    }

    pub fn load(path: &Path) -> Result<Self, SimError> {
        Inventory::load(path).map(Self::new)
    }

    pub fn settings(&self) -> &SimSettings {
        &self.settings
    }

    /// Current state of a server, if it exists
    pub fn server(&self, id: ResourceId) -> Option<ServerInfo> {
        self.lock().server_info(id, Instant::now()).ok()
    }

    pub fn disk(&self, id: ResourceId) -> Option<SimDisk> {
        self.lock().disks.get(&id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Request a power transition and wait until it converges
    async fn set_power(
        &self,
        op: CloudOp,
        id: ResourceId,
        target: PowerStatus,
    ) -> Result<(), CloudError> {
        {
            let mut state = self.lock();
            state.check_fault(op, Some(id))?;
            let now = Instant::now();
            let server = state.server_mut(id)?;
            if server.power_now(now) == target {
                return Ok(());
            }
            server.pending = Some(PendingPower {
                target,
                ready_at: now + self.settings.power_delay,
            });
        }

        match tokio::time::timeout(self.settings.timeout, self.wait_for_power(id, target)).await {
            Ok(result) => result,
            Err(_) => Err(CloudError::Timeout {
                op,
                after: self.settings.timeout,
            }),
        }
    }

    async fn wait_for_power(&self, id: ResourceId, target: PowerStatus) -> Result<(), CloudError> {
        loop {
            let power = self.lock().server_mut(id)?.power_now(Instant::now());
            if power == target {
                return Ok(());
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}

#[async_trait]
impl CloudAdapter for SimCloudAdapter {
    async fn resolve_resource(&self, id: ResourceId) -> Result<ServerInfo, CloudError> {
        let mut state = self.lock();
        state.check_fault(CloudOp::ResolveResource, Some(id))?;
        state.server_info(id, Instant::now())
    }

    async fn resolve_equivalent_plan(
        &self,
        cpu: u32,
        memory_gb: u32,
    ) -> Result<Plan, CloudError> {
        let state = self.lock();
        state.check_fault(CloudOp::ResolvePlan, None)?;
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
        self.set_power(CloudOp::PowerOff, id, PowerStatus::Down).await
    }

    async fn disconnect_all_disks(&self, server: ResourceId) -> Result<(), CloudError> {
        let mut state = self.lock();
        state.check_fault(CloudOp::DisconnectDisks, Some(server))?;
        let info = state.server_mut(server)?;
        if info.power_now(Instant::now()).is_up() {
            return Err(CloudError::operation(
                CloudOp::DisconnectDisks,
                format!("server {} is running", server),
            ));
        }
        let detached = std::mem::take(&mut info.disks);
        for id in detached {
            if let Some(disk) = state.disks.get_mut(&id) {
                disk.server = None;
            }
        }
        Ok(())
    }

    async fn clone_disk(&self, disk: ResourceId) -> Result<CloneProgress, CloudError> {
        let (source, mut fault) = {
            let state = self.lock();
            let source = state.disk(disk)?.clone();
            let fault = state.check_fault(CloudOp::CloneDisk, Some(disk)).err();
            (source, fault)
        };

        let (tx, progress) = CloneProgress::channel(1);
        let shared = Arc::clone(&self.state);
        let interval = self.settings.copy_interval;
        let chunk_mb = self.settings.copy_chunk_mb.max(1);
        tokio::spawn(async move {
            let mut migrated_mb = 0;
            loop {
                tokio::time::sleep(interval).await;
                migrated_mb = (migrated_mb + chunk_mb).min(source.size_mb);
                if tx.send(CloneEvent::Progress { migrated_mb }).await.is_err() {
                    return;
                }
                if let Some(err) = fault.take() {
                    let _ = tx.send(CloneEvent::Failed(err)).await;
                    return;
                }
                if migrated_mb >= source.size_mb {
                    break;
                }
            }

            let disk_id = {
                let mut state = shared.lock().unwrap_or_else(|e| e.into_inner());
                let id = state.issue_id();
                let copy = SimDisk {
                    id,
                    server: None,
                    source_disk: Some(source.id),
                    ..source.clone()
                };
                state.disks.insert(id, copy);
                id
            };
            let _ = tx
                .send(CloneEvent::Completed {
                    disk_id,
                    migrated_mb: source.size_mb,
                })
                .await;
        });
        Ok(progress)
    }

    async fn change_plan(&self, server: ResourceId, plan: &Plan) -> Result<ResourceId, CloudError> {
        let mut state = self.lock();
        state.check_fault(CloudOp::ChangePlan, Some(server))?;
        if !state.plans.iter().any(|p| p.id == plan.id) {
            return Err(CloudError::NotFound(format!("plan {}", plan.id)));
        }
        if state.server_mut(server)?.power_now(Instant::now()).is_up() {
            return Err(CloudError::operation(
                CloudOp::ChangePlan,
                format!("server {} must be powered off", server),
            ));
        }

        let mut moved = state
            .servers
            .remove(&server)
            .ok_or_else(|| CloudError::NotFound(format!("server {}", server)))?;
        let new_id = state.issue_id();
        moved.spec.id = new_id;
        moved.spec.cpu = plan.cpu;
        moved.spec.memory_gb = plan.memory_gb;
        moved.spec.generation = plan.generation;
        for id in &moved.disks {
            if let Some(disk) = state.disks.get_mut(id) {
                disk.server = Some(new_id);
            }
        }
        state.servers.insert(new_id, moved);
        Ok(new_id)
    }

    async fn connect_disks(
        &self,
        server: ResourceId,
        disks: &[ResourceId],
    ) -> Result<(), CloudError> {
        let mut state = self.lock();
        state.check_fault(CloudOp::ConnectDisks, Some(server))?;
        state.server_mut(server)?;
        for &id in disks {
            if let Some(attached) = state.disk(id)?.server {
                return Err(CloudError::operation(
                    CloudOp::ConnectDisks,
                    format!("disk {} is connected to server {}", id, attached),
                ));
            }
        }
        for &id in disks {
            if let Some(disk) = state.disks.get_mut(&id) {
                disk.server = Some(server);
            }
        }
        state.server_mut(server)?.disks.extend_from_slice(disks);
        Ok(())
    }

    async fn power_on(&self, id: ResourceId) -> Result<(), CloudError> {
        self.set_power(CloudOp::PowerOn, id, PowerStatus::Up).await
    }

    async fn delete_disk(&self, disk: ResourceId) -> Result<(), CloudError> {
        let mut state = self.lock();
        state.check_fault(CloudOp::DeleteDisk, Some(disk))?;
        if let Some(server) = state.disk(disk)?.server {
            return Err(CloudError::operation(
                CloudOp::DeleteDisk,
                format!("disk {} is connected to server {}", disk, server),
            ));
        }
        state.disks.remove(&disk);
        Ok(())
    }
}
