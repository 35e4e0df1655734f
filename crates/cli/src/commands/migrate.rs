// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `plan-migrate <ID>...` - migrate servers to the next-generation plan

use crate::output::TablePresenter;
use anyhow::{bail, Context, Result};
use clap::Args;
use pm_adapters::{CloudAdapter, SimCloudAdapter, TracedCloudAdapter};
use pm_core::{FileMigrationLog, Generation, MigrateOptions, MigrationLog, ResourceId, SystemClock};
use pm_engine::{apply_with_presenter, EngineDeps, MigrationEngine};
use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Cloud inventory to migrate against
    #[arg(long, value_name = "FILE")]
    pub inventory: PathBuf,

    /// Options file (TOML); flags override it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Delete the original disks after migration
    #[arg(long)]
    pub cleanup_disk: bool,

    /// Leave servers powered off after the plan change
    #[arg(long)]
    pub disable_reboot: bool,

    /// Servers migrated at the same time
    #[arg(long, value_name = "N")]
    pub max_workers: Option<usize>,

    /// Do not ask for confirmation
    #[arg(short = 'y', long)]
    pub assumeyes: bool,

    /// Directory for the migration log
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub log_dir: PathBuf,

    /// Do not write a migration log
    #[arg(long)]
    pub no_log: bool,

    /// Servers to migrate
    #[arg(value_name = "ID", required = true)]
    pub ids: Vec<ResourceId>,
}

impl MigrateArgs {
    /// File options with flag overrides applied
    pub fn options(&self) -> Result<MigrateOptions> {
        let mut options = match &self.config {
            Some(path) => MigrateOptions::load(path)?,
            None => MigrateOptions::default(),
        };
        if self.cleanup_disk {
            options = options.with_delete_disks(true);
        }
        if self.disable_reboot {
            options = options.with_disable_boot(true);
        }
        if let Some(max_workers) = self.max_workers {
            options = options.with_max_workers(max_workers);
        }
        options.validate()?;
        Ok(options)
    }
}

/// Run a migration; returns the number of servers that failed
pub async fn handle(args: MigrateArgs) -> Result<usize> {
    let options = args.options()?;
    let cloud = TracedCloudAdapter::new(
        SimCloudAdapter::load(&args.inventory).context("Migrate is failed")?,
    );
    let ids = dedup(&args.ids);

    preflight(&cloud, &ids).await?;

    if !args.assumeyes && !confirm(ids.len())? {
        println!("Canceled");
        return Ok(0);
    }

    let log: Option<Arc<dyn MigrationLog>> = if args.no_log {
        None
    } else {
        let log = FileMigrationLog::create_in(&args.log_dir).with_context(|| {
            format!(
                "Migrate is failed: cannot create log in {}",
                args.log_dir.display()
            )
        })?;
        eprintln!("Log: {}", log.path().display());
        Some(Arc::new(log))
    };

    let deps = EngineDeps {
        cloud,
        clock: SystemClock,
        log,
    };
    let engine = MigrationEngine::build(deps, &ids, &options)
        .await
        .context("Migrate is failed")?;

    let mut presenter = TablePresenter::stdout();
    apply_with_presenter(&engine, &mut presenter, options.refresh_interval).await;

    Ok(engine.has_errors().len())
}

/// Drop repeated IDs, keeping the first occurrence
pub fn dedup(ids: &[ResourceId]) -> Vec<ResourceId> {
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    unique
}

/// Check every server can be migrated before anything changes
pub async fn preflight<A: CloudAdapter>(cloud: &A, ids: &[ResourceId]) -> Result<()> {
    for &id in ids {
        let server = cloud
            .resolve_resource(id)
            .await
            .with_context(|| format!("Migrate is failed: server {}", id))?;
        if server.disks.is_empty() {
            bail!("Server[{}] doesn't have any disks", id);
        }
        if server.generation != Generation::G1 {
            bail!("Server[{}] is already on plan {}", id, server.generation);
        }
    }
    Ok(())
}

fn confirm(count: usize) -> Result<bool> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        bail!("confirmation required; pass --assumeyes to migrate without a terminal");
    }

    print!("Migrate {} server(s)? [y/N]: ", count);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    stdin.lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
#[path = "migrate_tests.rs"]
mod tests;
