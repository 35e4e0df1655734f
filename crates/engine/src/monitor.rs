// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live progress reporting while a migration runs

use crate::engine::MigrationEngine;
use crate::server::ServerMigration;
use pm_adapters::CloudAdapter;
use pm_core::{Clock, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Renders engine snapshots
pub trait Presenter<C: Clock = SystemClock> {
    /// Servers currently running
    fn show_active(&mut self, active: &[Arc<ServerMigration<C>>]);

    /// Servers that have stopped on an error
    fn show_errors(&mut self, failed: &[Arc<ServerMigration<C>>]);

    /// Called once after every pipeline has ended
    fn show_finished(&mut self);
}

/// Apply the engine, refreshing the presenter every `refresh` until it ends
pub async fn apply_with_presenter<A, C, P>(
    engine: &MigrationEngine<A, C>,
    presenter: &mut P,
    refresh: Duration,
) where
    A: CloudAdapter,
    C: Clock,
    P: Presenter<C> + ?Sized,
{
    let apply = engine.apply();
    tokio::pin!(apply);

    let mut ticker = tokio::time::interval(refresh.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            () = &mut apply => break,
            _ = ticker.tick() => {
                presenter.show_active(&engine.working());
                presenter.show_errors(&engine.has_errors());
            }
        }
    }

    presenter.show_active(&engine.working());
    presenter.show_finished();
    presenter.show_errors(&engine.has_errors());
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
