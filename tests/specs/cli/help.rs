// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help and version specs

use crate::prelude::*;

#[test]
fn help_lists_migration_flags() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("--inventory")
        .stdout_has("--cleanup-disk")
        .stdout_has("--disable-reboot")
        .stdout_has("--max-workers")
        .stdout_has("--assumeyes");
}

#[test]
fn version_prints_name() {
    cli().args(&["--version"]).passes().stdout_has("plan-migrate");
}
