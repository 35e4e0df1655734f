// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Plan migration engine

mod disk;
mod engine;
mod error;
mod monitor;
mod pipeline;
mod server;

pub use disk::DiskMigration;
pub use engine::{EngineDeps, MigrationEngine};
pub use error::BuildError;
pub use monitor::{apply_with_presenter, Presenter};
pub use server::{ServerMigration, StatusRow};
