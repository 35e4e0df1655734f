// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argument and input error specs

use crate::prelude::*;

#[test]
fn no_ids_is_a_usage_error() {
    let temp = Project::with_inventory(TWO_SERVERS);
    temp.plan_migrate()
        .args(&["--inventory", "cloud.toml"])
        .fails()
        .code(2)
        .stderr_has("<ID>");
}

#[test]
fn non_numeric_id_is_rejected() {
    let temp = Project::with_inventory(TWO_SERVERS);
    temp.migrate(&["web"]).fails().code(2).stderr_has("invalid value");
}

#[test]
fn missing_inventory_fails() {
    let temp = Project::empty();
    temp.migrate(&["1"])
        .fails()
        .stderr_has("Migrate is failed");
}

#[test]
fn zero_workers_is_rejected() {
    let temp = Project::with_inventory(TWO_SERVERS);
    temp.migrate(&["--max-workers", "0", "1"])
        .fails()
        .stderr_has("max_workers must be at least 1");
}

#[test]
fn unknown_config_key_is_rejected() {
    let temp = Project::with_inventory(TWO_SERVERS);
    temp.file("migrate.toml", "workers = 3\n");
    temp.migrate(&["--config", "migrate.toml", "1"]).fails();
}

#[test]
fn confirmation_requires_a_terminal() {
    let temp = Project::with_inventory(TWO_SERVERS);
    temp.plan_migrate()
        .args(&["--inventory", "cloud.toml", "--no-log", "1"])
        .fails()
        .stderr_has("--assumeyes");
}
