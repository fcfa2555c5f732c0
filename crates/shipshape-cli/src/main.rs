//! # shipshape — container build-recipe auditor
//!
//! Checks a Dockerfile, its companion files, and (optionally) the built
//! image against a fixed best-practice checklist, and always produces a
//! complete scored report.

mod commands;
mod output;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
        )
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
