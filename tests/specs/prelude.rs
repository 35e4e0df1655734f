// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for CLI specs

#![allow(dead_code)]

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Two G1 servers with one disk each; transitions settle in milliseconds
pub const TWO_SERVERS: &str = r#"
[settings]
power_delay = "10ms"
copy_interval = "5ms"
poll_interval = "5ms"

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
size_mb = 8192
server = 1

[[disk]]
id = 21
name = "db-root"
size_mb = 8192
server = 2
"#;

/// Power-off of server 2 fails
pub const LOCKED_DB: &str = r#"
[[fault]]
op = "power_off"
target = 2
message = "server is locked"
"#;

/// A scratch directory holding the inventory and the migration log
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// A project whose `cloud.toml` holds `inventory`
    pub fn with_inventory(inventory: &str) -> Self {
        let project = Self::empty();
        project.file("cloud.toml", inventory);
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Migration logs written into the project directory
    pub fn logs(&self) -> Vec<PathBuf> {
        let mut logs: Vec<PathBuf> = std::fs::read_dir(self.path())
            .unwrap()
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("migrate-") && n.ends_with(".log"))
            })
            .collect();
        logs.sort();
        logs
    }

    /// `plan-migrate` run from the project directory
    pub fn plan_migrate(&self) -> Cli {
        let mut cmd = Command::cargo_bin("plan-migrate").unwrap();
        cmd.current_dir(self.path()).env_remove("RUST_LOG");
        Cli { cmd }
    }

    /// `plan-migrate --inventory cloud.toml -y <args>`
    pub fn migrate(&self, args: &[&str]) -> Cli {
        self.plan_migrate()
            .args(&["--inventory", "cloud.toml", "-y"])
            .args(args)
    }
}

/// `plan-migrate` outside any project
pub fn cli() -> Cli {
    Cli {
        cmd: Command::cargo_bin("plan-migrate").unwrap(),
    }
}

pub struct Cli {
    cmd: Command,
}

impl Cli {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn passes(mut self) -> Output {
        Output(self.cmd.assert().success())
    }

    pub fn fails(mut self) -> Output {
        Output(self.cmd.assert().failure())
    }
}

pub struct Output(Assert);

impl Output {
    pub fn stdout_has(self, text: &str) -> Self {
        Self(self.0.stdout(contains(text)))
    }

    pub fn stdout_lacks(self, text: &str) -> Self {
        Self(self.0.stdout(contains(text).not()))
    }

    pub fn stderr_has(self, text: &str) -> Self {
        Self(self.0.stderr(contains(text)))
    }

    pub fn code(self, code: i32) -> Self {
        Self(self.0.code(code))
    }
}
