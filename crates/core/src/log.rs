// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-oriented migration log.
//!
//! Steps write one line when they start, finish or fail. A migration can run
//! without any log at all; the engine simply passes `None`.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Timestamp layout of each line written by [`FileMigrationLog`]
pub const LINE_TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Sink for prefixed step messages
pub trait MigrationLog: Send + Sync {
    fn line(&self, message: &str);
}

/// Appends timestamped lines to a file
#[derive(Debug)]
pub struct FileMigrationLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileMigrationLog {
    /// Open (or create) `path` for appending
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Open a fresh `migrate-YYYYMMDD-HHMMSS.log` inside `dir`
    pub fn create_in(dir: impl AsRef<Path>) -> io::Result<Self> {
        let name = format!(
            "migrate-{}.log",
            chrono::Local::now().format("%Y%m%d-%H%M%S")
        );
        Self::open(dir.as_ref().join(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MigrationLog for FileMigrationLog {
    fn line(&self, message: &str) {
        let stamp = chrono::Local::now().format(LINE_TIMESTAMP_FORMAT);
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(file, "{} {}", stamp, message) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write migration log");
        }
    }
}

/// Collects lines in memory for assertions
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct MemoryMigrationLog {
    lines: Mutex<Vec<String>>,
}

#[cfg(any(test, feature = "test-support"))]
impl MemoryMigrationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Lines containing `needle`
    pub fn matching(&self, needle: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.contains(needle))
            .collect()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl MigrationLog for MemoryMigrationLog {
    fn line(&self, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
