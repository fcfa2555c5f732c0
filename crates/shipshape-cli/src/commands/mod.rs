//! CLI command definitions and dispatch.

pub mod check;
pub mod grade;
pub mod inspect;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shipshape_common::config::AuditConfig;

/// shipshape — container build-recipe auditor.
#[derive(Parser, Debug)]
#[command(name = "shipshape", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Emit the report as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to an explicit configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the static checks (no build tool required).
    Check(check::CheckArgs),
    /// Run the full checklist: static checks plus build, size, and
    /// container probes.
    Grade(grade::GradeArgs),
    /// Parse the build recipe and dump the typed model.
    Inspect(inspect::InspectArgs),
}

/// Shared global options handed to every command.
#[derive(Debug)]
pub struct Globals {
    /// Whether to emit JSON.
    pub json: bool,
    /// Explicit configuration file, if given.
    pub config: Option<PathBuf>,
}

impl Globals {
    /// Resolves the audit configuration for a project directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but is invalid.
    pub fn load_config(&self, project_dir: &std::path::Path) -> anyhow::Result<AuditConfig> {
        match &self.config {
            Some(path) => Ok(AuditConfig::load(path)?),
            None => Ok(AuditConfig::load_or_default(project_dir)?),
        }
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let globals = Globals {
        json: cli.json,
        config: cli.config,
    };
    match cli.command {
        Command::Check(args) => check::execute(args, &globals),
        Command::Grade(args) => grade::execute(args, &globals),
        Command::Inspect(args) => inspect::execute(args, &globals),
    }
}
