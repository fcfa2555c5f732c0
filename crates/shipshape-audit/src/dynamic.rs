//! Dynamic checks that exercise the external build tool.
//!
//! Every check still appends exactly one result: when the tool is
//! unavailable or the build fails, dependent checks fail with a
//! diagnostic instead of being skipped.

use std::time::Duration;

use shipshape_artifact::docker::{DockerCli, throwaway_name};
use shipshape_artifact::metadata::ImageMetadata;
use shipshape_artifact::probe::HealthProbe;
use shipshape_common::config::AuditConfig;
use shipshape_common::types::PortMapping;

use crate::checks::ProjectSnapshot;
use crate::report::AuditReport;

/// Stable names of the dynamic checks, in evaluation order.
pub const DYNAMIC_CHECKS: &[&str] = &[
    "image-builds",
    "image-size",
    "container-responds",
    "compose-up",
];

/// Options for the dynamic phase.
#[derive(Debug, Clone, Copy)]
pub struct DynamicOptions {
    /// Whether to start the compose project (`compose-up` check).
    pub compose_up: bool,
}

impl Default for DynamicOptions {
    fn default() -> Self {
        Self { compose_up: true }
    }
}

#[allow(clippy::cast_precision_loss)]
fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / 1_000_000.0
}

/// Runs the dynamic checks against the project and its built artifact.
pub fn run_dynamic_checks(
    snapshot: &ProjectSnapshot,
    config: &AuditConfig,
    docker: Option<&DockerCli>,
    options: DynamicOptions,
    report: &mut AuditReport,
) {
    let Some(docker) = docker else {
        let reason = "build tool unavailable: docker not found on PATH";
        report.add_fail("image-builds", reason);
        report.add_fail("image-size", reason);
        report.add_fail("container-responds", reason);
        if options.compose_up {
            report.add_fail("compose-up", reason);
        }
        return;
    };

    let tag = throwaway_name("image");
    let built = check_image_builds(snapshot, config, docker, &tag, report);
    check_image_size(config, docker, &tag, built, report);
    check_container_responds(config, docker, &tag, built, report);
    if built {
        if let Err(e) = docker.remove_image(&tag) {
            tracing::warn!(tag, error = %e, "failed to remove throwaway image");
        }
    }
    if options.compose_up {
        check_compose_up(snapshot, config, docker, report);
    }
}

fn check_image_builds(
    snapshot: &ProjectSnapshot,
    config: &AuditConfig,
    docker: &DockerCli,
    tag: &str,
    report: &mut AuditReport,
) -> bool {
    if snapshot.recipe_text.is_none() {
        report.add_fail(
            "image-builds",
            format!("{} is missing", snapshot.recipe_file),
        );
        return false;
    }
    match docker.build(
        &snapshot.root,
        &snapshot.recipe_file,
        tag,
        Duration::from_secs(config.build_timeout_secs),
    ) {
        Ok(()) => {
            report.add_pass("image-builds", "image built successfully");
            true
        }
        Err(e) => {
            report.add_fail("image-builds", e.to_string());
            false
        }
    }
}

fn check_image_size(
    config: &AuditConfig,
    docker: &DockerCli,
    tag: &str,
    built: bool,
    report: &mut AuditReport,
) {
    if !built {
        report.add_fail("image-size", "image was not built");
        return;
    }
    match docker.inspect_image(tag) {
        Ok(meta) => appraise_image_size(&meta, config.max_image_size_bytes, report),
        Err(e) => report.add_fail("image-size", e.to_string()),
    }
}

fn appraise_image_size(meta: &ImageMetadata, limit: u64, report: &mut AuditReport) {
    // Inclusive boundary: an artifact of exactly the limit passes.
    if meta.size_bytes <= limit {
        report.add_pass(
            "image-size",
            format!(
                "{:.1} MB (limit {:.0} MB)",
                megabytes(meta.size_bytes),
                megabytes(limit)
            ),
        );
    } else {
        report.add_fail(
            "image-size",
            format!(
                "{:.1} MB exceeds the {:.0} MB limit",
                megabytes(meta.size_bytes),
                megabytes(limit)
            ),
        );
    }
}

fn check_container_responds(
    config: &AuditConfig,
    docker: &DockerCli,
    tag: &str,
    built: bool,
    report: &mut AuditReport,
) {
    if !built {
        report.add_fail("container-responds", "image was not built");
        return;
    }
    let name = throwaway_name("probe");
    let ports = PortMapping {
        host: config.probe_host_port,
        container: config.service_port,
    };
    if let Err(e) = docker.run_detached(tag, &name, ports) {
        report.add_fail("container-responds", e.to_string());
        return;
    }

    let probe = HealthProbe::localhost(config.probe_host_port, &config.health_path);
    let outcome = probe.wait_healthy();

    if let Err(e) = docker.remove_container(&name) {
        tracing::warn!(name, error = %e, "failed to remove probe container");
    }

    match outcome {
        Ok(()) => report.add_pass(
            "container-responds",
            format!("{} reported healthy", probe.url),
        ),
        Err(e) => report.add_fail("container-responds", e.to_string()),
    }
}

fn check_compose_up(
    snapshot: &ProjectSnapshot,
    config: &AuditConfig,
    docker: &DockerCli,
    report: &mut AuditReport,
) {
    if snapshot.compose.is_none() {
        report.add_fail("compose-up", "no compose file to start");
        return;
    }
    let timeout = Duration::from_secs(config.build_timeout_secs);
    let outcome = docker.compose_up(&snapshot.root, timeout);
    if let Err(e) = docker.compose_down(&snapshot.root) {
        tracing::warn!(error = %e, "failed to tear down compose project");
    }
    match outcome {
        Ok(()) => report.add_pass("compose-up", "compose project started and became healthy"),
        Err(e) => report.add_fail("compose-up", e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipshape_common::config::AuditConfig;

    fn empty_snapshot() -> ProjectSnapshot {
        ProjectSnapshot {
            root: std::path::PathBuf::from("/tmp/project"),
            recipe_file: "Dockerfile".into(),
            recipe_text: None,
            recipe: None,
            ignore_text: None,
            compose: None,
        }
    }

    #[test]
    fn missing_tool_fails_every_dynamic_check() {
        let mut report = AuditReport::new(None);
        run_dynamic_checks(
            &empty_snapshot(),
            &AuditConfig::default(),
            None,
            DynamicOptions::default(),
            &mut report,
        );
        let names: Vec<&str> = report.checks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, DYNAMIC_CHECKS.to_vec());
        assert_eq!(report.passed(), 0);
        assert!(report.checks[0].reason.contains("unavailable"));
    }

    #[test]
    fn skipping_compose_up_removes_the_check() {
        let mut report = AuditReport::new(None);
        run_dynamic_checks(
            &empty_snapshot(),
            &AuditConfig::default(),
            None,
            DynamicOptions { compose_up: false },
            &mut report,
        );
        assert_eq!(report.total(), 3);
        assert!(report.checks.iter().all(|c| c.name != "compose-up"));
    }

    #[test]
    fn megabytes_is_decimal() {
        assert!((megabytes(200_000_000) - 200.0).abs() < f64::EPSILON);
    }

    fn sized_metadata(size_bytes: u64) -> ImageMetadata {
        ImageMetadata {
            size_bytes,
            user: None,
            healthcheck: None,
            exposed_ports: Vec::new(),
        }
    }

    #[test]
    fn image_size_at_exact_limit_passes() {
        let mut report = AuditReport::new(None);
        appraise_image_size(&sized_metadata(200_000_000), 200_000_000, &mut report);
        assert_eq!(report.passed(), 1);
        assert!(report.checks[0].reason.contains("200.0 MB"));
    }

    #[test]
    fn image_size_one_byte_over_limit_fails() {
        let mut report = AuditReport::new(None);
        appraise_image_size(&sized_metadata(200_000_001), 200_000_000, &mut report);
        assert_eq!(report.failed(), 1);
        assert!(report.checks[0].reason.contains("exceeds"));
    }
}
