//! Audit configuration model.
//!
//! Every threshold the checklist uses lives here so a project can relax or
//! tighten it through a `shipshape.json` file without rebuilding.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{Result, ShipshapeError};

/// Tunable parameters for an audit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Recipe file name relative to the project directory.
    pub recipe_file: String,
    /// Maximum accepted artifact size in bytes (inclusive).
    pub max_image_size_bytes: u64,
    /// Name fragments accepted in the final stage's base image.
    pub slim_base_markers: Vec<String>,
    /// Compose service expected to front the API.
    pub api_service: String,
    /// Container port the service listens on.
    pub service_port: u16,
    /// Host port bound when probing a throwaway container.
    pub probe_host_port: u16,
    /// Health endpoint path probed on a running container.
    pub health_path: String,
    /// Image build deadline in seconds.
    pub build_timeout_secs: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            recipe_file: constants::RECIPE_FILE.into(),
            max_image_size_bytes: constants::MAX_IMAGE_SIZE_BYTES,
            slim_base_markers: constants::SLIM_BASE_MARKERS
                .iter()
                .map(|&m| m.to_owned())
                .collect(),
            api_service: constants::DEFAULT_API_SERVICE.into(),
            service_port: constants::DEFAULT_SERVICE_PORT,
            probe_host_port: constants::DEFAULT_PROBE_HOST_PORT,
            health_path: constants::HEALTH_PATH.into(),
            build_timeout_secs: constants::BUILD_TIMEOUT_SECS,
        }
    }
}

impl AuditConfig {
    /// Loads the configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ShipshapeError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Loads `shipshape.json` from the project directory, falling back to
    /// defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file exists but cannot be parsed.
    pub fn load_or_default(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(constants::CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_constants() {
        let cfg = AuditConfig::default();
        assert_eq!(cfg.max_image_size_bytes, 200_000_000);
        assert_eq!(cfg.recipe_file, "Dockerfile");
        assert_eq!(cfg.api_service, "api");
        assert!(cfg.slim_base_markers.iter().any(|m| m == "slim"));
    }

    #[test]
    fn partial_json_overrides_defaults() {
        let cfg: AuditConfig =
            serde_json::from_str(r#"{"max_image_size_bytes": 50000000}"#).expect("should parse");
        assert_eq!(cfg.max_image_size_bytes, 50_000_000);
        assert_eq!(cfg.service_port, 5000);
    }
}
