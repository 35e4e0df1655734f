// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Migration log specs

use crate::prelude::*;

#[test]
fn run_writes_a_log_in_the_log_dir() {
    let temp = Project::with_inventory(TWO_SERVERS);
    temp.migrate(&["--log-dir", ".", "1"])
        .passes()
        .stderr_has("Log: ");

    let logs = temp.logs();
    assert_eq!(logs.len(), 1);
    let text = std::fs::read_to_string(&logs[0]).unwrap();
    assert!(text.contains(": Server[1:web] : Shutdown Server started"));
    assert!(text.contains(":   Disk[11:web] : Clone Disk"));
    assert!(text.contains("Boot Server"));
}

#[test]
fn no_log_skips_the_file() {
    let temp = Project::with_inventory(TWO_SERVERS);
    temp.migrate(&["--no-log", "1"]).passes();
    assert!(temp.logs().is_empty());
}

#[test]
fn unwritable_log_dir_fails_before_migrating() {
    let temp = Project::with_inventory(TWO_SERVERS);
    temp.migrate(&["--log-dir", "missing/dir", "1"])
        .fails()
        .stderr_has("cannot create log")
        .stdout_lacks("Migration finished");
}
