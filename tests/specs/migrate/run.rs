// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Migration run specs

use crate::prelude::*;

#[test]
fn migrates_servers_and_finishes() {
    let temp = Project::with_inventory(TWO_SERVERS);
    temp.migrate(&["--no-log", "1", "2"])
        .passes()
        .stdout_has("=== Migration finished ===")
        .stdout_lacks("*** Errors ***");
}

#[test]
fn repeated_ids_migrate_once() {
    let temp = Project::with_inventory(TWO_SERVERS);
    temp.migrate(&["--no-log", "1", "1"])
        .passes()
        .stdout_has("=== Migration finished ===");
}

#[test]
fn cleanup_and_no_reboot_flags_succeed() {
    let temp = Project::with_inventory(TWO_SERVERS);
    temp.migrate(&[
        "--no-log",
        "--cleanup-disk",
        "--disable-reboot",
        "--max-workers",
        "1",
        "1",
        "2",
    ])
    .passes()
    .stdout_has("=== Migration finished ===");
}

#[test]
fn failed_server_is_reported_and_exit_is_nonzero() {
    let inventory = format!("{}{}", TWO_SERVERS, LOCKED_DB);
    let temp = Project::with_inventory(&inventory);
    temp.migrate(&["--no-log", "1", "2"])
        .fails()
        .code(1)
        .stdout_has("=== Migration finished ===")
        .stdout_has("*** Errors ***")
        .stdout_has("Server[2:db] Error: power_off failed: server is locked")
        .stdout_lacks("Server[1:web] Error");
}
