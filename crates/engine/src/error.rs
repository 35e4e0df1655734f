// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for building a migration

use pm_adapters::CloudError;
use pm_core::ResourceId;
use thiserror::Error;

/// Errors that prevent a migration from being built
#[derive(Debug, Error)]
pub enum BuildError {
    /// A server or its replacement plan could not be resolved
    #[error("lookup failed for server {id}: {source}")]
    Lookup {
        id: ResourceId,
        #[source]
        source: CloudError,
    },
}
