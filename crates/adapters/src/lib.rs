// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the cloud the migration runs against

pub mod cloud;
pub mod sim;
pub mod traced;

pub use cloud::{CloneEvent, CloneProgress, CloudAdapter, CloudError, CloudOp};
pub use sim::{Inventory, SimCloudAdapter, SimError, SimSettings};
pub use traced::TracedCloudAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use cloud::{server_info, CloudCall, FakeCloudAdapter};
