//! `shipshape inspect` — Parse the build recipe and dump the typed model.

use std::path::PathBuf;

use clap::Args;
use shipshape_recipe::parse_recipe;

use super::Globals;

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Project directory containing the build recipe.
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

/// Executes the `inspect` command.
///
/// # Errors
///
/// Returns an error if the recipe is missing or fails to parse.
pub fn execute(args: InspectArgs, globals: &Globals) -> anyhow::Result<()> {
    let config = globals.load_config(&args.path)?;
    let recipe_path = args.path.join(&config.recipe_file);
    tracing::info!(path = %recipe_path.display(), "inspecting recipe");

    let text = std::fs::read_to_string(&recipe_path)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", recipe_path.display()))?;
    let recipe = parse_recipe(&text)?;

    println!("{}", serde_json::to_string_pretty(&recipe)?);
    Ok(())
}
