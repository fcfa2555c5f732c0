//! Typed view of the build tool's `image inspect` output.
//!
//! Only the fields the checklist interrogates are modeled; everything
//! else in the inspect JSON is ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shipshape_common::constants::ROOT_USERS;
use shipshape_common::error::{Result, ShipshapeError};

/// Metadata of a built image, as reported by the build tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Artifact size in bytes.
    pub size_bytes: u64,
    /// Configured run-as user, if any.
    pub user: Option<String>,
    /// Configured health probe, if any.
    pub healthcheck: Option<HealthcheckConfig>,
    /// Ports the image documents as listening.
    pub exposed_ports: Vec<u16>,
}

/// Health probe configuration baked into an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthcheckConfig {
    /// Probe command in the tool's `Test` encoding
    /// (`["CMD", …]` / `["CMD-SHELL", …]` / `["NONE"]`).
    pub test: Vec<String>,
}

impl HealthcheckConfig {
    /// Whether the probe is active (not disabled via `NONE`).
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.test.is_empty() && self.test[0] != "NONE"
    }
}

impl ImageMetadata {
    /// Whether the image's processes run as the default privileged
    /// account.
    ///
    /// An empty or absent user means root.
    #[must_use]
    pub fn runs_as_root(&self) -> bool {
        match self.user.as_deref() {
            None | Some("") => true,
            Some(user) => {
                let account = user.split(':').next().unwrap_or(user);
                ROOT_USERS.contains(&account)
            }
        }
    }

    /// Whether an active health probe is configured.
    #[must_use]
    pub fn has_health_probe(&self) -> bool {
        self.healthcheck.as_ref().is_some_and(HealthcheckConfig::is_active)
    }

    /// Parses the JSON emitted by `image inspect`.
    ///
    /// The tool emits a one-element array per inspected image.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the array is empty.
    pub fn from_inspect_json(json: &str) -> Result<Self> {
        let mut entries: Vec<RawInspect> = serde_json::from_str(json)?;
        let raw = entries.pop().ok_or_else(|| ShipshapeError::NotFound {
            kind: "image",
            id: "inspect output was an empty array".into(),
        })?;

        let exposed_ports = raw
            .config
            .exposed_ports
            .unwrap_or_default()
            .keys()
            .filter_map(|spec| spec.split('/').next()?.parse::<u16>().ok())
            .collect();

        Ok(Self {
            size_bytes: raw.size,
            user: raw.config.user.filter(|u| !u.is_empty()),
            healthcheck: raw
                .config
                .healthcheck
                .map(|h| HealthcheckConfig { test: h.test }),
            exposed_ports,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawInspect {
    #[serde(rename = "Size")]
    size: u64,
    #[serde(rename = "Config", default)]
    config: RawConfig,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(rename = "User", default)]
    user: Option<String>,
    #[serde(rename = "Healthcheck", default)]
    healthcheck: Option<RawHealthcheck>,
    #[serde(rename = "ExposedPorts", default)]
    exposed_ports: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct RawHealthcheck {
    #[serde(rename = "Test", default)]
    test: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSPECT_JSON: &str = r#"[
      {
        "Id": "sha256:0f3e",
        "Size": 142000000,
        "Config": {
          "User": "appuser",
          "ExposedPorts": {"5000/tcp": {}},
          "Healthcheck": {
            "Test": ["CMD-SHELL", "curl -f http://localhost:5000/health || exit 1"],
            "Interval": 30000000000
          }
        }
      }
    ]"#;

    #[test]
    fn parses_inspect_output() {
        let meta = ImageMetadata::from_inspect_json(INSPECT_JSON).expect("should parse");
        assert_eq!(meta.size_bytes, 142_000_000);
        assert_eq!(meta.user.as_deref(), Some("appuser"));
        assert_eq!(meta.exposed_ports, vec![5000]);
        assert!(!meta.runs_as_root());
        assert!(meta.has_health_probe());
    }

    #[test]
    fn empty_user_is_root() {
        let meta = ImageMetadata::from_inspect_json(r#"[{"Size": 10, "Config": {"User": ""}}]"#)
            .expect("should parse");
        assert!(meta.runs_as_root());
        assert!(meta.user.is_none());
    }

    #[test]
    fn numeric_root_user_is_root() {
        let meta =
            ImageMetadata::from_inspect_json(r#"[{"Size": 10, "Config": {"User": "0:0"}}]"#)
                .expect("should parse");
        assert!(meta.runs_as_root());
    }

    #[test]
    fn disabled_healthcheck_is_not_a_probe() {
        let json = r#"[{"Size": 10, "Config": {"Healthcheck": {"Test": ["NONE"]}}}]"#;
        let meta = ImageMetadata::from_inspect_json(json).expect("should parse");
        assert!(!meta.has_health_probe());
    }

    #[test]
    fn empty_array_is_not_found() {
        let err = ImageMetadata::from_inspect_json("[]").unwrap_err();
        assert!(err.to_string().contains("not found"), "got: {err}");
    }

    #[test]
    fn missing_config_defaults() {
        let meta = ImageMetadata::from_inspect_json(r#"[{"Size": 5}]"#).expect("should parse");
        assert!(meta.runs_as_root());
        assert!(meta.exposed_ports.is_empty());
        assert!(!meta.has_health_probe());
    }
}
