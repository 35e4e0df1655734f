// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Preflight specs
//!
//! Every requested server is checked before any of them is touched.

use crate::prelude::*;

#[test]
fn unknown_server_aborts_the_run() {
    let temp = Project::with_inventory(TWO_SERVERS);
    temp.migrate(&["--no-log", "1", "9"])
        .fails()
        .stderr_has("Migrate is failed: server 9")
        .stdout_lacks("Migration finished");
}

#[test]
fn server_without_disks_aborts_the_run() {
    let inventory = format!(
        "{}\n[[server]]\nid = 3\nname = \"bare\"\ncpu = 2\nmemory_gb = 4\n",
        TWO_SERVERS
    );
    let temp = Project::with_inventory(&inventory);
    temp.migrate(&["--no-log", "3"])
        .fails()
        .stderr_has("Server[3] doesn't have any disks");
}

#[test]
fn migrated_server_aborts_the_run() {
    let inventory = format!(
        "{}\n[[server]]\nid = 3\nname = \"new\"\ncpu = 2\nmemory_gb = 4\ngeneration = 200\n\n[[disk]]\nid = 31\nname = \"new-root\"\nsize_mb = 1024\nserver = 3\n",
        TWO_SERVERS
    );
    let temp = Project::with_inventory(&inventory);
    temp.migrate(&["--no-log", "3"])
        .fails()
        .stderr_has("Server[3] is already on plan gen2");
}

#[test]
fn failed_preflight_writes_no_log() {
    let temp = Project::with_inventory(TWO_SERVERS);
    temp.migrate(&["9"]).fails();
    assert!(temp.logs().is_empty());
}
