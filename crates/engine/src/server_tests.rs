// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pm_adapters::{server_info, CloudOp};
use pm_core::{FakeClock, Generation, MemoryMigrationLog, PowerStatus, StepStatus};
use yare::parameterized;

fn g2_plan() -> Plan {
    Plan {
        id: ResourceId(200_002_004),
        name: "2core-4GB".to_string(),
        cpu: 2,
        memory_gb: 4,
        generation: Generation::G2,
    }
}

fn migration(
    power: PowerStatus,
    disks: &[u64],
    options: &MigrateOptions,
) -> ServerMigration<FakeClock> {
    ServerMigration::new(
        &server_info(1, power, disks),
        g2_plan(),
        options,
        FakeClock::new(),
        None,
    )
}

#[parameterized(
    running_server = { PowerStatus::Up, true },
    stopped_server = { PowerStatus::Down, false },
)]
fn shutdown_enabled_only_when_running(power: PowerStatus, enabled: bool) {
    let server = migration(power, &[11], &MigrateOptions::default());
    assert_eq!(server.shutdown_step().is_enabled(), enabled);
}

#[parameterized(
    no_disks = { &[], false },
    one_disk = { &[11], true },
    three_disks = { &[11, 12, 13], true },
)]
fn disk_steps_enabled_only_with_disks(disks: &[u64], enabled: bool) {
    let server = migration(PowerStatus::Up, disks, &MigrateOptions::default());
    assert_eq!(server.disconnect_step().is_enabled(), enabled);
    assert_eq!(server.connect_step().is_enabled(), enabled);
    assert!(server.change_plan_step().is_enabled());
}

#[test]
fn boot_disabled_by_options() {
    let options = MigrateOptions::default().with_disable_boot(true);
    let server = migration(PowerStatus::Up, &[11], &options);
    assert_eq!(server.boot_step().status(), StepStatus::Disabled);

    let server = migration(PowerStatus::Up, &[11], &MigrateOptions::default());
    assert_eq!(server.boot_step().status(), StepStatus::Waiting);
}

#[test]
fn delete_steps_follow_cleanup_option() {
    let options = MigrateOptions::default().with_delete_disks(true);
    let server = migration(PowerStatus::Up, &[11, 12], &options);
    assert!(server.disks().iter().all(|d| d.delete_step().is_enabled()));

    let server = migration(PowerStatus::Up, &[11, 12], &MigrateOptions::default());
    assert!(server.disks().iter().all(|d| !d.delete_step().is_enabled()));
}

#[test]
fn one_disk_migration_per_source_disk() {
    let server = migration(PowerStatus::Up, &[11, 12, 13], &MigrateOptions::default());

    let ids: Vec<u64> = server.disks().iter().map(|d| d.original_id().get()).collect();
    assert_eq!(ids, vec![11, 12, 13]);
    assert!(server.disks().iter().all(|d| d.cloned_id().is_zero()));
    assert_eq!(
        server.cloned_disk_ids(),
        vec![ResourceId::UNSET, ResourceId::UNSET, ResourceId::UNSET]
    );
}

#[test]
fn identity_before_plan_change() {
    let server = migration(PowerStatus::Up, &[11], &MigrateOptions::default());
    assert_eq!(server.target_id(), ResourceId(1));
    assert_eq!(server.name(), "server-1");
    assert_eq!(server.plan().generation, Generation::G2);
    assert_eq!(server.migrated_id(), None);

    server.set_migrated_id(ResourceId(77));
    assert_eq!(server.migrated_id(), Some(ResourceId(77)));
}

#[test]
fn first_failure_is_kept() {
    let server = migration(PowerStatus::Up, &[11], &MigrateOptions::default());
    assert!(!server.has_error());

    server.fail(CloudError::operation(CloudOp::PowerOff, "first"));
    server.fail(CloudError::operation(CloudOp::PowerOn, "second"));

    assert!(server.has_error());
    assert_eq!(
        server.error().map(|e| e.to_string()),
        Some("power_off failed: first".to_string())
    );
}

#[test]
fn status_rows_one_per_disk() {
    let options = MigrateOptions::default().with_delete_disks(true);
    let server = migration(PowerStatus::Down, &[11, 12], &options);
    server.change_plan_step().start();

    let rows = server.status_rows();

    assert_eq!(
        rows,
        vec![
            StatusRow {
                server: "1".to_string(),
                shutdown: "-".to_string(),
                disk: "(waiting)".to_string(),
                plan_change: "running(0s)".to_string(),
                boot: "(waiting)".to_string(),
                cleanup: "(waiting)".to_string(),
            };
            2
        ]
    );
    assert_eq!(rows[0].cells()[3], "running(0s)");
}

#[test]
fn server_without_disks_has_no_rows() {
    let server = migration(PowerStatus::Up, &[], &MigrateOptions::default());
    assert!(server.status_rows().is_empty());
}

#[test]
fn headers_match_cells() {
    assert_eq!(StatusRow::HEADERS.len(), 6);
    assert_eq!(StatusRow::HEADERS[2], "Disk");
}

#[test]
fn log_lines_use_server_prefix() {
    let log = Arc::new(MemoryMigrationLog::new());
    let server = ServerMigration::new(
        &server_info(5, PowerStatus::Up, &[11]),
        g2_plan(),
        &MigrateOptions::default(),
        FakeClock::new(),
        Some(log.clone() as Arc<dyn MigrationLog>),
    );

    server.shutdown_step().start();
    server.shutdown_step().set_error("timed out");

    assert_eq!(
        log.lines(),
        vec![
            ": Server[5:server-5] : Shutdown Server started".to_string(),
            ": Server[5:server-5] : Shutdown Server error: timed out".to_string(),
        ]
    );
}
