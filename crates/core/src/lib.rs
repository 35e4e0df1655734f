// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pm-core: leaf types for the plan migration tool
//!
//! This crate provides:
//! - Resource identities and live-state snapshots
//! - The `Step` state machine tracked by every migration stage
//! - A clock abstraction for testable timing
//! - The line-oriented migration log
//! - Migration options

pub mod clock;
pub mod config;
pub mod id;
pub mod log;
pub mod resource;
pub mod step;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, MigrateOptions};
pub use id::ResourceId;
pub use log::{FileMigrationLog, MigrationLog};
pub use resource::{DiskInfo, Generation, Plan, PowerStatus, ServerInfo};
pub use step::{Step, StepState, StepStatus};

#[cfg(any(test, feature = "test-support"))]
pub use log::MemoryMigrationLog;
