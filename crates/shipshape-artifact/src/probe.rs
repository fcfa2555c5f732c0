//! Blocking HTTP probe of a running container's health endpoint.

use std::time::Duration;

use serde::Deserialize;
use shipshape_common::constants::{PROBE_ATTEMPTS, PROBE_TIMEOUT_SECS};
use shipshape_common::error::{Result, ShipshapeError};

/// Expected shape of the health endpoint's JSON body.
#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
}

/// Parameters of a health probe.
#[derive(Debug, Clone)]
pub struct HealthProbe {
    /// Full URL of the health endpoint.
    pub url: String,
    /// Number of attempts before giving up.
    pub attempts: u32,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Delay between attempts.
    pub interval: Duration,
}

impl HealthProbe {
    /// Builds a probe for `path` on `localhost:port`.
    #[must_use]
    pub fn localhost(port: u16, path: &str) -> Self {
        Self {
            url: format!("http://localhost:{port}{path}"),
            attempts: PROBE_ATTEMPTS,
            timeout: Duration::from_secs(PROBE_TIMEOUT_SECS),
            interval: Duration::from_secs(1),
        }
    }

    /// Probes the endpoint until it reports healthy or attempts run out.
    ///
    /// Success requires an HTTP 2xx response whose JSON body carries
    /// `"status": "healthy"`.
    ///
    /// # Errors
    ///
    /// Returns a `Tool` error describing the last failure when every
    /// attempt fails.
    pub fn wait_healthy(&self) -> Result<()> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ShipshapeError::Tool {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        let mut last_failure = String::from("no attempts made");
        for attempt in 1..=self.attempts {
            tracing::debug!(url = %self.url, attempt, "probing health endpoint");
            match self.attempt(&client) {
                Ok(()) => return Ok(()),
                Err(reason) => last_failure = reason,
            }
            if attempt < self.attempts {
                std::thread::sleep(self.interval);
            }
        }
        Err(ShipshapeError::Tool {
            message: format!(
                "{} did not report healthy after {} attempts: {last_failure}",
                self.url, self.attempts
            ),
        })
    }

    fn attempt(&self, client: &reqwest::blocking::Client) -> std::result::Result<(), String> {
        let response = client
            .get(&self.url)
            .send()
            .map_err(|e| format!("request failed: {e}"))?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("unexpected HTTP status {status}"));
        }
        let body: HealthBody = response
            .json()
            .map_err(|e| format!("malformed health body: {e}"))?;
        if body.status == "healthy" {
            Ok(())
        } else {
            Err(format!("service reported status \"{}\"", body.status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localhost_probe_builds_url() {
        let probe = HealthProbe::localhost(5001, "/health");
        assert_eq!(probe.url, "http://localhost:5001/health");
        assert_eq!(probe.attempts, 5);
    }

    #[test]
    fn unreachable_endpoint_reports_last_failure() {
        // Reserved TEST-NET-1 address; connection attempts fail fast or
        // time out without reaching anything.
        let probe = HealthProbe {
            url: "http://192.0.2.1:9/health".into(),
            attempts: 1,
            timeout: Duration::from_millis(200),
            interval: Duration::from_millis(1),
        };
        let err = probe.wait_healthy().unwrap_err();
        assert!(err.to_string().contains("did not report healthy"), "got: {err}");
    }
}
