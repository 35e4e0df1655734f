// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! plan-migrate - move servers to their next-generation plan

mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use commands::migrate;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "plan-migrate",
    version,
    about = "Migrate servers and their disks to the next-generation plan"
)]
struct Cli {
    #[command(flatten)]
    migrate: migrate::MigrateArgs,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    setup_logging();
    let cli = Cli::parse();

    // Pipelines are not drained on interrupt
    ctrlc::set_handler(|| {
        eprintln!("signal received; shutting down");
        std::process::exit(1);
    })?;

    let failed = migrate::handle(cli.migrate).await?;
    if failed > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
