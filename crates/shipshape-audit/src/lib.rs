//! # shipshape-audit
//!
//! The checklist evaluator: scores a project and its built artifact
//! against a fixed set of container best-practice criteria.
//!
//! Every check is an independent predicate over an immutable
//! [`checks::ProjectSnapshot`]; the evaluator never aborts early and
//! always produces one result per defined check.

pub mod checks;
pub mod dynamic;
pub mod report;

use std::path::Path;

use shipshape_artifact::DockerCli;
use shipshape_common::config::AuditConfig;
use shipshape_common::types::Sha256Digest;

pub use crate::checks::ProjectSnapshot;
pub use crate::dynamic::DynamicOptions;
pub use crate::report::{AuditReport, CheckResult, CheckStatus};

fn new_report(snapshot: &ProjectSnapshot) -> AuditReport {
    let digest = snapshot
        .recipe_text
        .as_deref()
        .map(|text| Sha256Digest::of_bytes(text.as_bytes()));
    AuditReport::new(digest)
}

/// Runs the static checks only (no build tool required).
#[must_use]
pub fn run_static_audit(root: &Path, config: &AuditConfig) -> AuditReport {
    tracing::info!(root = %root.display(), "running static audit");
    let snapshot = ProjectSnapshot::load(root, config);
    let mut report = new_report(&snapshot);
    checks::run_static_checks(&snapshot, config, &mut report);
    report
}

/// Runs the full checklist, discovering the build tool on `PATH`.
///
/// A missing tool is not an error: the dynamic checks fail with a
/// diagnostic and the report is still complete.
#[must_use]
pub fn run_full_audit(root: &Path, config: &AuditConfig, options: DynamicOptions) -> AuditReport {
    let docker = match DockerCli::discover() {
        Ok(cli) => Some(cli),
        Err(e) => {
            tracing::warn!(error = %e, "build tool not available");
            None
        }
    };
    run_full_audit_with(root, config, docker.as_ref(), options)
}

/// Runs the full checklist against an explicit tool handle (or none).
#[must_use]
pub fn run_full_audit_with(
    root: &Path,
    config: &AuditConfig,
    docker: Option<&DockerCli>,
    options: DynamicOptions,
) -> AuditReport {
    tracing::info!(root = %root.display(), "running full audit");
    let snapshot = ProjectSnapshot::load(root, config);
    let mut report = new_report(&snapshot);
    checks::run_static_checks(&snapshot, config, &mut report);
    dynamic::run_dynamic_checks(&snapshot, config, docker, options, &mut report);
    report
}
