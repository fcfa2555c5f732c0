//! Static checks over a project snapshot.
//!
//! Each check is an independent predicate: it appends exactly one result
//! to the report and never short-circuits the others. Checks that need
//! the parsed recipe fail with a diagnostic when parsing already failed,
//! rather than being skipped.

use std::path::{Path, PathBuf};

use shipshape_artifact::compose;
use shipshape_common::config::AuditConfig;
use shipshape_common::constants::{COMPOSE_FILES, IGNORE_FILE, ROOT_USERS};
use shipshape_recipe::ast::HealthcheckDecl;
use shipshape_recipe::{Recipe, Stage, parse_recipe};

use crate::report::AuditReport;

/// Stable names of the static checks, in evaluation order.
pub const STATIC_CHECKS: &[&str] = &[
    "recipe-exists",
    "recipe-valid",
    "multi-stage",
    "slim-base",
    "non-root-user",
    "health-probe",
    "ignore-file",
    "compose-valid",
];

/// Immutable view of the project files an audit inspects.
///
/// Loading never fails: missing or unreadable files become `None` and the
/// corresponding checks report the absence.
#[derive(Debug)]
pub struct ProjectSnapshot {
    /// Project root directory.
    pub root: PathBuf,
    /// Recipe file name that was looked up.
    pub recipe_file: String,
    /// Raw recipe text, when the file was readable.
    pub recipe_text: Option<String>,
    /// Parse outcome, when text was available.
    pub recipe: Option<Result<Recipe, String>>,
    /// Ignore-file content, when present.
    pub ignore_text: Option<String>,
    /// Compose file name and content, when one was found.
    pub compose: Option<(String, String)>,
}

impl ProjectSnapshot {
    /// Reads the project files named by the configuration.
    #[must_use]
    pub fn load(root: &Path, config: &AuditConfig) -> Self {
        let recipe_text = std::fs::read_to_string(root.join(&config.recipe_file)).ok();
        let recipe = recipe_text
            .as_deref()
            .map(|text| parse_recipe(text).map_err(|e| e.to_string()));
        let ignore_text = std::fs::read_to_string(root.join(IGNORE_FILE)).ok();
        let compose = COMPOSE_FILES.iter().find_map(|name| {
            std::fs::read_to_string(root.join(name))
                .ok()
                .map(|text| ((*name).to_owned(), text))
        });

        tracing::debug!(
            root = %root.display(),
            recipe = recipe_text.is_some(),
            ignore = ignore_text.is_some(),
            compose = compose.is_some(),
            "loaded project snapshot"
        );

        Self {
            root: root.to_path_buf(),
            recipe_file: config.recipe_file.clone(),
            recipe_text,
            recipe,
            ignore_text,
            compose,
        }
    }

    /// The parsed recipe, or the reason it is unavailable.
    fn recipe_ref(&self) -> Result<&Recipe, String> {
        match &self.recipe {
            Some(Ok(recipe)) => Ok(recipe),
            Some(Err(e)) => Err(format!("recipe does not parse: {e}")),
            None => Err(format!("{} is missing", self.recipe_file)),
        }
    }

    fn final_stage(&self) -> Result<&Stage, String> {
        self.recipe_ref().and_then(|r| {
            r.final_stage()
                .ok_or_else(|| "recipe has no stages".to_owned())
        })
    }
}

/// Runs every static check, appending one result each to the report.
pub fn run_static_checks(
    snapshot: &ProjectSnapshot,
    config: &AuditConfig,
    report: &mut AuditReport,
) {
    check_recipe_exists(snapshot, report);
    check_recipe_valid(snapshot, report);
    check_multi_stage(snapshot, report);
    check_slim_base(snapshot, config, report);
    check_non_root_user(snapshot, report);
    check_health_probe(snapshot, report);
    check_ignore_file(snapshot, report);
    check_compose_valid(snapshot, config, report);
}

fn check_recipe_exists(snapshot: &ProjectSnapshot, report: &mut AuditReport) {
    if snapshot.recipe_text.is_some() {
        report.add_pass("recipe-exists", format!("{} present", snapshot.recipe_file));
    } else {
        report.add_fail(
            "recipe-exists",
            format!(
                "no {} in {}",
                snapshot.recipe_file,
                snapshot.root.display()
            ),
        );
    }
}

fn check_recipe_valid(snapshot: &ProjectSnapshot, report: &mut AuditReport) {
    match &snapshot.recipe {
        Some(Ok(recipe)) => report.add_pass(
            "recipe-valid",
            format!("parsed cleanly: {} stage(s)", recipe.stage_count()),
        ),
        Some(Err(e)) => report.add_fail("recipe-valid", e.clone()),
        None => report.add_fail(
            "recipe-valid",
            format!("{} is missing", snapshot.recipe_file),
        ),
    }
}

fn check_multi_stage(snapshot: &ProjectSnapshot, report: &mut AuditReport) {
    match snapshot.recipe_ref() {
        Ok(recipe) if recipe.stage_count() >= 2 => report.add_pass(
            "multi-stage",
            format!("{} stages", recipe.stage_count()),
        ),
        Ok(_) => report.add_fail(
            "multi-stage",
            "single-stage build; split dependency install from the runtime stage",
        ),
        Err(reason) => report.add_fail("multi-stage", reason),
    }
}

fn check_slim_base(snapshot: &ProjectSnapshot, config: &AuditConfig, report: &mut AuditReport) {
    match snapshot.final_stage() {
        Ok(stage) => {
            let base = stage.base.as_str().to_ascii_lowercase();
            if config
                .slim_base_markers
                .iter()
                .any(|marker| base.contains(marker.as_str()))
            {
                report.add_pass("slim-base", format!("final stage uses {}", stage.base));
            } else {
                report.add_fail(
                    "slim-base",
                    format!(
                        "final base {} matches none of [{}]",
                        stage.base,
                        config.slim_base_markers.join(", ")
                    ),
                );
            }
        }
        Err(reason) => report.add_fail("slim-base", reason),
    }
}

fn check_non_root_user(snapshot: &ProjectSnapshot, report: &mut AuditReport) {
    let stage = match snapshot.final_stage() {
        Ok(stage) => stage,
        Err(reason) => {
            report.add_fail("non-root-user", reason);
            return;
        }
    };
    match stage.configured_user() {
        Some(user) => {
            let account = user.split(':').next().unwrap_or(user);
            if ROOT_USERS.contains(&account) {
                report.add_fail(
                    "non-root-user",
                    format!("final stage explicitly runs as {account}"),
                );
            } else if account_created(snapshot, account) {
                report.add_pass("non-root-user", format!("runs as {account}"));
            } else {
                // The account may come from the base image; the USER
                // instruction alone satisfies the criterion.
                report.add_pass(
                    "non-root-user",
                    format!("runs as {account} (account not created in recipe)"),
                );
            }
        }
        None => report.add_fail(
            "non-root-user",
            "no USER instruction in the final stage; processes run as root",
        ),
    }
}

fn account_created(snapshot: &ProjectSnapshot, _account: &str) -> bool {
    snapshot.recipe_ref().is_ok_and(|recipe| {
        recipe.stages.iter().any(|stage| {
            stage.run_commands().any(|cmd| {
                let text = cmd.as_text();
                text.contains("useradd") || text.contains("adduser")
            })
        })
    })
}

fn check_health_probe(snapshot: &ProjectSnapshot, report: &mut AuditReport) {
    match snapshot.final_stage() {
        Ok(stage) => match stage.healthcheck() {
            Some(HealthcheckDecl::Check(spec)) if spec.command.is_some() => {
                report.add_pass("health-probe", "HEALTHCHECK declared in final stage");
            }
            Some(HealthcheckDecl::Check(_)) => {
                report.add_fail("health-probe", "HEALTHCHECK declared without a command");
            }
            Some(HealthcheckDecl::None) => {
                report.add_fail("health-probe", "HEALTHCHECK NONE disables the probe");
            }
            None => report.add_fail(
                "health-probe",
                "no HEALTHCHECK in the final stage",
            ),
        },
        Err(reason) => report.add_fail("health-probe", reason),
    }
}

fn check_ignore_file(snapshot: &ProjectSnapshot, report: &mut AuditReport) {
    let Some(content) = snapshot.ignore_text.as_deref() else {
        report.add_fail("ignore-file", format!("{IGNORE_FILE} is missing"));
        return;
    };
    let covers_cache = content.contains("__pycache__") || content.contains("*.pyc");
    let covers_venv = content.contains("venv") || content.contains(".venv");
    if covers_cache && covers_venv {
        report.add_pass("ignore-file", format!("{IGNORE_FILE} covers cache and venv"));
    } else {
        let mut missing = Vec::new();
        if !covers_cache {
            missing.push("__pycache__/*.pyc");
        }
        if !covers_venv {
            missing.push("venv/.venv");
        }
        report.add_fail(
            "ignore-file",
            format!("{IGNORE_FILE} lacks patterns for: {}", missing.join(", ")),
        );
    }
}

fn check_compose_valid(snapshot: &ProjectSnapshot, config: &AuditConfig, report: &mut AuditReport) {
    let Some((name, text)) = snapshot.compose.as_ref() else {
        report.add_fail(
            "compose-valid",
            format!("no compose file ({}) found", COMPOSE_FILES.join(", ")),
        );
        return;
    };
    match compose::parse_compose(text)
        .and_then(|file| compose::validate_compose(&file, &config.api_service, config.service_port))
    {
        Ok(()) => report.add_pass(
            "compose-valid",
            format!(
                "{name} defines \"{}\" publishing port {}",
                config.api_service, config.service_port
            ),
        ),
        Err(e) => report.add_fail("compose-valid", e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_from(recipe: Option<&str>) -> ProjectSnapshot {
        ProjectSnapshot {
            root: PathBuf::from("/tmp/project"),
            recipe_file: "Dockerfile".into(),
            recipe_text: recipe.map(str::to_owned),
            recipe: recipe.map(|text| parse_recipe(text).map_err(|e| e.to_string())),
            ignore_text: None,
            compose: None,
        }
    }

    fn names(report: &AuditReport) -> Vec<&str> {
        report.checks.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn every_static_check_reports_once_on_empty_project() {
        let snapshot = snapshot_from(None);
        let mut report = AuditReport::new(None);
        run_static_checks(&snapshot, &AuditConfig::default(), &mut report);
        assert_eq!(names(&report), STATIC_CHECKS.to_vec());
        assert_eq!(report.passed(), 0);
    }

    #[test]
    fn unparseable_recipe_fails_dependent_checks_with_diagnostic() {
        let snapshot = snapshot_from(Some("FORM python:3.12\n"));
        let mut report = AuditReport::new(None);
        run_static_checks(&snapshot, &AuditConfig::default(), &mut report);
        assert_eq!(report.total(), STATIC_CHECKS.len());
        // recipe-exists still passes; everything recipe-dependent fails.
        assert_eq!(report.passed(), 1);
        let multi = &report.checks[2];
        assert!(multi.reason.contains("does not parse"), "got: {}", multi.reason);
    }

    #[test]
    fn single_stage_root_recipe_fails_the_hardening_checks() {
        let snapshot = snapshot_from(Some(
            "FROM python:3.12\nCOPY . .\nRUN pip install -r requirements.txt\nCMD [\"python\", \"app.py\"]\n",
        ));
        let mut report = AuditReport::new(None);
        run_static_checks(&snapshot, &AuditConfig::default(), &mut report);

        let by_name = |name: &str| {
            report
                .checks
                .iter()
                .find(|c| c.name == name)
                .unwrap_or_else(|| panic!("missing check {name}"))
        };
        assert_eq!(by_name("recipe-exists").status, crate::report::CheckStatus::Pass);
        assert_eq!(by_name("recipe-valid").status, crate::report::CheckStatus::Pass);
        assert_eq!(by_name("multi-stage").status, crate::report::CheckStatus::Fail);
        assert_eq!(by_name("slim-base").status, crate::report::CheckStatus::Fail);
        assert_eq!(by_name("non-root-user").status, crate::report::CheckStatus::Fail);
        assert_eq!(by_name("health-probe").status, crate::report::CheckStatus::Fail);
    }

    #[test]
    fn hardened_recipe_passes_recipe_checks() {
        let snapshot = snapshot_from(Some(
            "FROM python:3.12 AS builder\nRUN pip install --prefix=/install -r req.txt\nFROM python:3.12-slim\nCOPY --from=builder /install /usr/local\nRUN useradd --create-home appuser\nUSER appuser\nHEALTHCHECK CMD curl -f http://localhost:5000/health\nCMD [\"python\", \"app.py\"]\n",
        ));
        let mut report = AuditReport::new(None);
        run_static_checks(&snapshot, &AuditConfig::default(), &mut report);
        let failed: Vec<&str> = report
            .checks
            .iter()
            .filter(|c| c.status == crate::report::CheckStatus::Fail)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(failed, vec!["ignore-file", "compose-valid"]);
    }

    #[test]
    fn user_root_fails_even_with_useradd() {
        let snapshot = snapshot_from(Some(
            "FROM python:3.12-slim\nRUN useradd appuser\nUSER root\n",
        ));
        let mut report = AuditReport::new(None);
        run_static_checks(&snapshot, &AuditConfig::default(), &mut report);
        let non_root = report
            .checks
            .iter()
            .find(|c| c.name == "non-root-user")
            .expect("check present");
        assert_eq!(non_root.status, crate::report::CheckStatus::Fail);
        assert!(non_root.reason.contains("root"));
    }

    #[test]
    fn numeric_nonroot_uid_passes() {
        let snapshot = snapshot_from(Some("FROM python:3.12-slim\nUSER 1001:1001\n"));
        let mut report = AuditReport::new(None);
        run_static_checks(&snapshot, &AuditConfig::default(), &mut report);
        let non_root = report
            .checks
            .iter()
            .find(|c| c.name == "non-root-user")
            .expect("check present");
        assert_eq!(non_root.status, crate::report::CheckStatus::Pass);
    }

    #[test]
    fn ignore_file_requires_both_pattern_groups() {
        let mut snapshot = snapshot_from(Some("FROM a\n"));
        snapshot.ignore_text = Some("__pycache__/\n".into());
        let mut report = AuditReport::new(None);
        run_static_checks(&snapshot, &AuditConfig::default(), &mut report);
        let ignore = report
            .checks
            .iter()
            .find(|c| c.name == "ignore-file")
            .expect("check present");
        assert_eq!(ignore.status, crate::report::CheckStatus::Fail);
        assert!(ignore.reason.contains("venv"), "got: {}", ignore.reason);
    }

    #[test]
    fn compose_check_uses_configured_service() {
        let mut snapshot = snapshot_from(Some("FROM a\n"));
        snapshot.compose = Some((
            "docker-compose.yml".into(),
            "services:\n  api:\n    build: .\n    ports: [\"5000:5000\"]\n".into(),
        ));
        let mut report = AuditReport::new(None);
        run_static_checks(&snapshot, &AuditConfig::default(), &mut report);
        let compose = report
            .checks
            .iter()
            .find(|c| c.name == "compose-valid")
            .expect("check present");
        assert_eq!(compose.status, crate::report::CheckStatus::Pass);
    }
}
