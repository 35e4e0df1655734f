// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live status table for a running migration

use pm_core::Clock;
use pm_engine::{Presenter, ServerMigration, StatusRow};
use std::fmt::Write as _;
use std::io::{self, IsTerminal, Stdout, Write};
use std::sync::Arc;

/// Move the cursor home and clear the rest of the screen
const CLEAR_SCREEN: &str = "\x1b[1;1H\x1b[0J";

/// Minimum column widths, in header order
const MIN_WIDTHS: [usize; 6] = [0, 12, 24, 10, 12, 10];

/// Renders engine snapshots as a bordered table
pub struct TablePresenter<W: Write> {
    out: W,
    clear_screen: bool,
}

impl TablePresenter<Stdout> {
    /// Write to stdout, redrawing in place when it is a terminal
    pub fn stdout() -> Self {
        let out = io::stdout();
        let clear_screen = out.is_terminal();
        Self::new(out, clear_screen)
    }
}

impl<W: Write> TablePresenter<W> {
    pub fn new(out: W, clear_screen: bool) -> Self {
        Self { out, clear_screen }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        let written = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(e) = written {
            tracing::debug!(error = %e, "failed to write status");
        }
    }
}

impl<W: Write, C: Clock> Presenter<C> for TablePresenter<W> {
    fn show_active(&mut self, active: &[Arc<ServerMigration<C>>]) {
        let mut screen = String::new();
        if self.clear_screen {
            screen.push_str(CLEAR_SCREEN);
        }
        let rows: Vec<StatusRow> = active.iter().flat_map(|s| s.status_rows()).collect();
        if !rows.is_empty() {
            screen.push_str(&render_table(&rows));
            screen.push('\n');
        }
        self.emit(&screen);
    }

    fn show_errors(&mut self, failed: &[Arc<ServerMigration<C>>]) {
        if failed.is_empty() {
            return;
        }
        let mut screen = String::from("*** Errors ***\n");
        for server in failed {
            let message = server.error().map(|e| e.to_string()).unwrap_or_default();
            let _ = writeln!(
                screen,
                "  Server[{}:{}] Error: {}",
                server.target_id(),
                server.name(),
                message
            );
        }
        self.emit(&screen);
    }

    fn show_finished(&mut self) {
        self.emit("\n=== Migration finished ===\n\n");
    }
}

/// Render rows under the status headers. Cells may span several lines.
pub fn render_table(rows: &[StatusRow]) -> String {
    let mut widths = MIN_WIDTHS;
    for (width, header) in widths.iter_mut().zip(StatusRow::HEADERS) {
        *width = (*width).max(header.chars().count());
    }
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            let widest = cell.lines().map(|l| l.chars().count()).max().unwrap_or(0);
            *width = (*width).max(widest);
        }
    }

    let border = border(&widths);
    let mut table = String::new();
    table.push_str(&border);
    push_line(&mut table, &widths, &StatusRow::HEADERS);
    table.push_str(&border);
    for row in rows {
        let cells: Vec<Vec<&str>> = row
            .cells()
            .into_iter()
            .map(|c| c.lines().collect())
            .collect();
        let height = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);
        for line in 0..height {
            let parts: Vec<&str> = cells
                .iter()
                .map(|c| c.get(line).copied().unwrap_or(""))
                .collect();
            push_line(&mut table, &widths, &parts);
        }
    }
    table.push_str(&border);
    table
}

fn border(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
    }
    line.push('\n');
    line
}

fn push_line(table: &mut String, widths: &[usize], cells: &[&str]) {
    table.push('|');
    for (width, cell) in widths.iter().zip(cells) {
        let _ = write!(table, " {:<width$} |", cell, width = width);
    }
    table.push('\n');
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
