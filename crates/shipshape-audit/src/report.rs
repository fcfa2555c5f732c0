//! Audit report model.
//!
//! A report is an ordered list of named pass/fail results plus an
//! aggregate score. Checks append results through the sink methods;
//! nothing ever removes or reorders an entry, so two runs over the same
//! input produce identical reports.

use serde::{Deserialize, Serialize};
use shipshape_common::types::Sha256Digest;

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// The criterion is met.
    Pass,
    /// The criterion is not met or could not be evaluated.
    Fail,
}

/// A named check result with a human-readable reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Stable check name (kebab-case).
    pub name: String,
    /// Pass or fail.
    pub status: CheckStatus,
    /// Why the check passed or failed.
    pub reason: String,
}

/// Complete result of an audit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    /// RFC 3339 timestamp of the run.
    pub generated_at: String,
    /// Fingerprint of the recipe text, when one was readable.
    pub recipe_digest: Option<Sha256Digest>,
    /// Ordered check results.
    pub checks: Vec<CheckResult>,
}

impl AuditReport {
    /// Creates an empty report stamped with the current time.
    #[must_use]
    pub fn new(recipe_digest: Option<Sha256Digest>) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            recipe_digest,
            checks: Vec::new(),
        }
    }

    /// Records a passed check.
    pub fn add_pass(&mut self, name: &str, reason: impl Into<String>) {
        self.checks.push(CheckResult {
            name: name.to_owned(),
            status: CheckStatus::Pass,
            reason: reason.into(),
        });
    }

    /// Records a failed check.
    pub fn add_fail(&mut self, name: &str, reason: impl Into<String>) {
        self.checks.push(CheckResult {
            name: name.to_owned(),
            status: CheckStatus::Fail,
            reason: reason.into(),
        });
    }

    /// Number of passed checks.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::Pass)
            .count()
    }

    /// Number of failed checks.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.checks.len() - self.passed()
    }

    /// Total number of evaluated checks.
    #[must_use]
    pub fn total(&self) -> usize {
        self.checks.len()
    }

    /// Whether every check passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed() == 0 && !self.checks.is_empty()
    }

    /// Integer percentage of passed checks, rounded down.
    #[must_use]
    pub fn score_percent(&self) -> u8 {
        if self.checks.is_empty() {
            return 0;
        }
        u8::try_from(self.passed() * 100 / self.total()).unwrap_or(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_scores_zero() {
        let report = AuditReport::new(None);
        assert_eq!(report.score_percent(), 0);
        assert!(!report.all_passed());
    }

    #[test]
    fn score_is_floor_of_ratio() {
        let mut report = AuditReport::new(None);
        report.add_pass("a", "ok");
        report.add_pass("b", "ok");
        report.add_fail("c", "missing");
        assert_eq!(report.passed(), 2);
        assert_eq!(report.failed(), 1);
        // 2/3 = 66.6…%, reported as 66.
        assert_eq!(report.score_percent(), 66);
    }

    #[test]
    fn all_passed_requires_no_failures() {
        let mut report = AuditReport::new(None);
        report.add_pass("a", "ok");
        assert!(report.all_passed());
        report.add_fail("b", "nope");
        assert!(!report.all_passed());
        assert_eq!(report.score_percent(), 50);
    }

    #[test]
    fn results_keep_insertion_order() {
        let mut report = AuditReport::new(None);
        report.add_fail("first", "r1");
        report.add_pass("second", "r2");
        let names: Vec<&str> = report.checks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn report_serializes_to_json() {
        let mut report = AuditReport::new(None);
        report.add_pass("multi-stage", "2 stages");
        let json = serde_json::to_string(&report).expect("should serialize");
        assert!(json.contains("\"status\":\"pass\""), "got: {json}");
        assert!(json.contains("multi-stage"), "got: {json}");
    }
}
