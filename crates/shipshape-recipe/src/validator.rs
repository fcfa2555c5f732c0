//! Semantic validation of the parsed recipe.
//!
//! Checks for duplicate stage aliases and dangling stage references
//! before the recipe is handed to the audit.

use std::collections::HashSet;

use shipshape_common::error::{Result, ShipshapeError};

use crate::ast::{Instruction, Recipe};

/// Validates a parsed recipe for semantic correctness.
///
/// # Checks performed
///
/// 1. At least one stage is defined.
/// 2. No duplicate stage aliases.
/// 3. Every `COPY --from` references an earlier stage (by alias or
///    index) or an external image (contains `:` or `/`).
///
/// # Errors
///
/// Returns an error if any semantic check fails.
pub fn validate(recipe: &Recipe) -> Result<()> {
    tracing::debug!(stages = recipe.stage_count(), "validating recipe");
    check_nonempty(recipe)?;
    check_duplicate_aliases(recipe)?;
    check_copy_references(recipe)?;
    Ok(())
}

fn check_nonempty(recipe: &Recipe) -> Result<()> {
    if recipe.stages.is_empty() {
        return Err(ShipshapeError::Config {
            message: "recipe defines no stages (no FROM instruction)".into(),
        });
    }
    Ok(())
}

fn check_duplicate_aliases(recipe: &Recipe) -> Result<()> {
    let mut seen = HashSet::new();
    for stage in &recipe.stages {
        if let Some(alias) = &stage.alias {
            if !seen.insert(alias.as_str()) {
                return Err(ShipshapeError::Config {
                    message: format!("duplicate stage alias: \"{alias}\""),
                });
            }
        }
    }
    Ok(())
}

fn check_copy_references(recipe: &Recipe) -> Result<()> {
    for (index, stage) in recipe.stages.iter().enumerate() {
        let earlier: HashSet<&str> = recipe.stages[..index]
            .iter()
            .filter_map(|s| s.alias.as_deref())
            .collect();

        for instruction in &stage.instructions {
            let (Instruction::Copy(copy) | Instruction::Add(copy)) = instruction else {
                continue;
            };
            let Some(source) = copy.from.as_deref() else {
                continue;
            };
            if earlier.contains(source) {
                continue;
            }
            if let Ok(stage_index) = source.parse::<usize>() {
                if stage_index < index {
                    continue;
                }
                return Err(ShipshapeError::NotFound {
                    kind: "stage",
                    id: format!("--from={source} does not reference an earlier stage"),
                });
            }
            // `--from` may name an external image; only bare words that
            // look like aliases are treated as dangling references.
            if source.contains(':') || source.contains('/') {
                continue;
            }
            return Err(ShipshapeError::NotFound {
                kind: "stage",
                id: format!("--from={source} is not a defined stage alias"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_recipe;

    #[test]
    fn validate_accepts_forward_copy() {
        let input = "FROM python:3.12 AS builder\nFROM python:3.12-slim\nCOPY --from=builder /a /b\n";
        assert!(parse_recipe(input).is_ok());
    }

    #[test]
    fn validate_accepts_copy_by_index() {
        let input = "FROM a\nFROM b\nCOPY --from=0 /a /b\n";
        assert!(parse_recipe(input).is_ok());
    }

    #[test]
    fn validate_rejects_self_index() {
        let input = "FROM a\nFROM b\nCOPY --from=1 /a /b\n";
        let err = parse_recipe(input).unwrap_err();
        assert!(err.to_string().contains("earlier stage"), "got: {err}");
    }

    #[test]
    fn validate_rejects_unknown_alias() {
        let input = "FROM a\nFROM b\nCOPY --from=ghost /a /b\n";
        let err = parse_recipe(input).unwrap_err();
        assert!(err.to_string().contains("ghost"), "got: {err}");
    }

    #[test]
    fn validate_accepts_external_image_source() {
        let input = "FROM b\nCOPY --from=nginx:1.27 /etc/nginx /etc/nginx\n";
        assert!(parse_recipe(input).is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_alias() {
        let input = "FROM a AS build\nFROM b AS build\n";
        let err = parse_recipe(input).unwrap_err();
        assert!(err.to_string().contains("duplicate stage alias"), "got: {err}");
    }

    #[test]
    fn validate_rejects_later_alias() {
        let input = "FROM b\nCOPY --from=tail /a /b\nFROM c AS tail\n";
        let err = parse_recipe(input).unwrap_err();
        assert!(err.to_string().contains("tail"), "got: {err}");
    }
}
