//! `shipshape check` — Run the static checks over a project directory.

use std::path::PathBuf;

use clap::Args;
use shipshape_audit::run_static_audit;

use super::Globals;
use crate::output;

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Project directory containing the build recipe.
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

/// Executes the `check` command.
///
/// Exits with status 1 when any check fails, so CI can gate on it; the
/// report is always rendered in full first.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the report
/// cannot be rendered.
pub fn execute(args: CheckArgs, globals: &Globals) -> anyhow::Result<()> {
    tracing::info!(path = %args.path.display(), "static audit");
    let config = globals.load_config(&args.path)?;
    let report = run_static_audit(&args.path, &config);

    output::render(&report, globals.json)?;

    if !report.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}
