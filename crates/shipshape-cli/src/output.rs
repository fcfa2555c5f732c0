//! Formatted output helpers for CLI commands.
//!
//! Renders an audit report either as aligned human-readable text with a
//! score bar, or as JSON for machine consumption.

use shipshape_audit::{AuditReport, CheckStatus};

const BAR_WIDTH: usize = 20;

/// Renders a report to stdout in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(report: &AuditReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render_text(report));
    }
    Ok(())
}

/// Renders a report as human-readable text.
#[must_use]
pub fn render_text(report: &AuditReport) -> String {
    let mut out = String::new();
    let width = report
        .checks
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0);

    for check in &report.checks {
        let tag = match check.status {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
        };
        out.push_str(&format!(
            "[{tag}] {name:<width$}  {reason}\n",
            name = check.name,
            reason = check.reason,
        ));
    }

    out.push('\n');
    out.push_str(&format!(
        "{} {}/{} checks passed ({}%)\n",
        score_bar(report.score_percent()),
        report.passed(),
        report.total(),
        report.score_percent(),
    ));
    out.push_str(if report.all_passed() {
        "verdict: shipshape\n"
    } else {
        "verdict: needs work\n"
    });
    out
}

fn score_bar(percent: u8) -> String {
    let filled = usize::from(percent) * BAR_WIDTH / 100;
    let mut bar = String::with_capacity(BAR_WIDTH);
    for i in 0..BAR_WIDTH {
        bar.push(if i < filled { '█' } else { '░' });
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> AuditReport {
        let mut report = AuditReport::new(None);
        report.add_pass("multi-stage", "2 stages");
        report.add_fail("ignore-file", ".dockerignore is missing");
        report
    }

    #[test]
    fn render_text_lists_every_check() {
        let text = render_text(&sample_report());
        assert!(text.contains("[PASS] multi-stage"), "got: {text}");
        assert!(text.contains("[FAIL] ignore-file"), "got: {text}");
        assert!(text.contains("1/2 checks passed (50%)"), "got: {text}");
        assert!(text.contains("needs work"), "got: {text}");
    }

    #[test]
    fn render_text_full_score_verdict() {
        let mut report = AuditReport::new(None);
        report.add_pass("a", "ok");
        let text = render_text(&report);
        assert!(text.contains("(100%)"), "got: {text}");
        assert!(text.contains("shipshape"), "got: {text}");
    }

    #[test]
    fn score_bar_is_fixed_width() {
        assert_eq!(score_bar(0).chars().count(), BAR_WIDTH);
        assert_eq!(score_bar(100).chars().count(), BAR_WIDTH);
        assert_eq!(score_bar(100), "█".repeat(BAR_WIDTH));
        assert_eq!(score_bar(50).chars().filter(|&c| c == '█').count(), 10);
    }
}
