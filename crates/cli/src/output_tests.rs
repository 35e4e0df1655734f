// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pm_adapters::SimCloudAdapter;
use pm_core::{MigrateOptions, ResourceId, SystemClock};
use pm_engine::{EngineDeps, MigrationEngine};

const INVENTORY: &str = r#"
[settings]
power_delay = "1s"

[[plan]]
id = 200002004
name = "2core-4GB"
cpu = 2
memory_gb = 4
generation = 200

[[server]]
id = 1
name = "web"
power = "up"
cpu = 2
memory_gb = 4

[[server]]
id = 2
name = "db"
power = "up"
cpu = 2
memory_gb = 4

[[disk]]
id = 11
name = "web-root"
size_mb = 4096
server = 1

[[disk]]
id = 21
name = "db-root"
size_mb = 4096
server = 2

[[fault]]
op = "power_off"
target = 2
message = "server is locked"
"#;

fn row() -> StatusRow {
    StatusRow {
        server: "1".to_string(),
        shutdown: "done".to_string(),
        disk: "11(3s)\n1024MB/20480MB".to_string(),
        plan_change: "(waiting)".to_string(),
        boot: "(waiting)".to_string(),
        cleanup: "-".to_string(),
    }
}

async fn applied_engine() -> MigrationEngine<SimCloudAdapter, SystemClock> {
    let deps = EngineDeps {
        cloud: SimCloudAdapter::from_toml(INVENTORY).unwrap(),
        clock: SystemClock,
        log: None,
    };
    let engine = MigrationEngine::build(
        deps,
        &[ResourceId(1), ResourceId(2)],
        &MigrateOptions::default(),
    )
    .await
    .unwrap();
    engine.apply().await;
    engine
}

fn presenter() -> TablePresenter<Vec<u8>> {
    TablePresenter::new(Vec::new(), false)
}

fn output(presenter: TablePresenter<Vec<u8>>) -> String {
    String::from_utf8(presenter.into_inner()).unwrap()
}

#[test]
fn table_has_header_and_borders() {
    let table = render_table(&[row()]);
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("+--------+"));
    assert_eq!(lines[0], lines[2]);
    assert_eq!(lines[0], lines[5]);
    assert!(lines[1].starts_with("| Server | Shutdown     | Disk "));
    assert!(lines
        .iter()
        .all(|l| l.chars().count() == lines[0].chars().count()));
}

#[test]
fn multi_line_cells_span_rows() {
    let table = render_table(&[row()]);
    let lines: Vec<&str> = table.lines().collect();

    assert!(lines[3].starts_with("| 1      | done         | 11(3s) "));
    let expected = format!(
        "|{}|{}| {:<24} |{}|{}|{}|",
        " ".repeat(8),
        " ".repeat(14),
        "1024MB/20480MB",
        " ".repeat(12),
        " ".repeat(14),
        " ".repeat(12)
    );
    assert_eq!(lines[4], expected);
}

#[test]
fn wide_cells_grow_their_column() {
    let mut wide = row();
    wide.cleanup = "a-very-long-cleanup-status".to_string();

    let table = render_table(&[wide]);

    assert!(table.contains("| a-very-long-cleanup-status |"));
}

#[test]
fn empty_snapshot_prints_nothing() {
    let mut presenter = presenter();
    Presenter::<SystemClock>::show_active(&mut presenter, &[]);
    assert_eq!(output(presenter), "");
}

#[test]
fn clears_screen_on_terminal() {
    let mut presenter = TablePresenter::new(Vec::new(), true);
    Presenter::<SystemClock>::show_active(&mut presenter, &[]);
    assert_eq!(output(presenter), CLEAR_SCREEN);
}

#[test]
fn finished_banner() {
    let mut presenter = presenter();
    Presenter::<SystemClock>::show_finished(&mut presenter);
    assert_eq!(output(presenter), "\n=== Migration finished ===\n\n");
}

#[tokio::test(start_paused = true)]
async fn errors_list_failed_servers() {
    let engine = applied_engine().await;
    let mut presenter = presenter();

    presenter.show_errors(&engine.has_errors());

    assert_eq!(
        output(presenter),
        "*** Errors ***\n  Server[2:db] Error: power_off failed: server is locked\n"
    );
}

#[test]
fn no_errors_prints_nothing() {
    let mut presenter = presenter();
    Presenter::<SystemClock>::show_errors(&mut presenter, &[]);
    assert_eq!(output(presenter), "");
}

#[tokio::test(start_paused = true)]
async fn active_servers_render_one_row_per_disk() {
    let engine = applied_engine().await;
    let mut presenter = presenter();

    presenter.show_active(engine.servers());

    let text = output(presenter);
    assert!(text.contains("| 1      | done "));
    assert!(text.contains("| 2      | error "));
    assert_eq!(text.lines().filter(|l| l.starts_with("| 2 ")).count(), 1);
}
