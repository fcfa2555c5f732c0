//! `shipshape grade` — Run the full checklist, including the build,
//! size, and container probes.

use std::path::PathBuf;

use clap::Args;
use shipshape_artifact::DockerCli;
use shipshape_audit::{DynamicOptions, run_full_audit};
use shipshape_common::constants::APP_NAME;

use super::Globals;
use crate::output;

/// Arguments for the `grade` subcommand.
#[derive(Args, Debug)]
pub struct GradeArgs {
    /// Project directory containing the build recipe.
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Skip starting the compose project (drops the compose-up check).
    #[arg(long)]
    pub skip_compose_up: bool,
}

/// Executes the `grade` command.
///
/// An interrupt mid-run removes any throwaway probe containers before
/// exiting.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the report
/// cannot be rendered.
pub fn execute(args: GradeArgs, globals: &Globals) -> anyhow::Result<()> {
    tracing::info!(path = %args.path.display(), "full audit");
    let config = globals.load_config(&args.path)?;

    if let Ok(docker) = DockerCli::discover() {
        let prefix = format!("{APP_NAME}-");
        ctrlc::set_handler(move || {
            if let Err(e) = docker.remove_matching(&prefix) {
                tracing::warn!(error = %e, "interrupt cleanup failed");
            }
            std::process::exit(130);
        })?;
    }

    let options = DynamicOptions {
        compose_up: !args.skip_compose_up,
    };
    let report = run_full_audit(&args.path, &config, options);

    output::render(&report, globals.json)?;

    if !report.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}
