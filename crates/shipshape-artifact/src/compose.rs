//! Typed model of a `docker-compose.yml` service composition.
//!
//! Only the keys the audit interrogates are modeled strictly; fields with
//! several accepted YAML shapes (`depends_on`, `environment`) are kept as
//! raw values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shipshape_common::error::{Result, ShipshapeError};
use shipshape_common::types::PortMapping;

/// A parsed service-composition file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposeFile {
    /// Named services keyed by service name.
    #[serde(default)]
    pub services: BTreeMap<String, Service>,
    /// Named volumes (shape not interpreted).
    #[serde(default)]
    pub volumes: Option<serde_yaml::Value>,
    /// Named networks (shape not interpreted).
    #[serde(default)]
    pub networks: Option<serde_yaml::Value>,
}

/// A single service definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Service {
    /// Image reference, when the service pulls an image.
    #[serde(default)]
    pub image: Option<String>,
    /// Build context, when the service builds locally.
    #[serde(default)]
    pub build: Option<BuildSpec>,
    /// Published ports.
    #[serde(default)]
    pub ports: Vec<PortEntry>,
    /// Startup ordering constraints (list or map form).
    #[serde(default)]
    pub depends_on: Option<serde_yaml::Value>,
    /// Environment variables (list or map form).
    #[serde(default)]
    pub environment: Option<serde_yaml::Value>,
    /// Restart policy.
    #[serde(default)]
    pub restart: Option<String>,
    /// Service-level health check (shape not interpreted).
    #[serde(default)]
    pub healthcheck: Option<serde_yaml::Value>,
}

impl Service {
    /// Whether the service has an artifact source (image or build).
    #[must_use]
    pub fn has_source(&self) -> bool {
        self.image.is_some() || self.build.is_some()
    }

    /// Port mappings that parse as `host:container` pairs.
    #[must_use]
    pub fn port_mappings(&self) -> Vec<PortMapping> {
        self.ports
            .iter()
            .filter_map(|entry| entry.mapping().ok())
            .collect()
    }
}

/// `build:` in either short (string) or long (mapping) form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildSpec {
    /// Short form: the build context path.
    Context(String),
    /// Long form with explicit keys.
    Detailed {
        /// Build context path.
        #[serde(default)]
        context: Option<String>,
        /// Recipe file relative to the context.
        #[serde(default)]
        dockerfile: Option<String>,
    },
}

/// A `ports:` entry, either a bare number or a mapping string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortEntry {
    /// `- 5000`
    Number(u16),
    /// `- "5000:5000"` (possibly with host IP or protocol suffix)
    Text(String),
}

impl PortEntry {
    /// Resolves the entry to a `host:container` mapping.
    ///
    /// # Errors
    ///
    /// Returns an error for long-syntax entries this model does not
    /// interpret.
    pub fn mapping(&self) -> Result<PortMapping> {
        match self {
            Self::Number(port) => Ok(PortMapping {
                host: *port,
                container: *port,
            }),
            Self::Text(text) => {
                // Strip a protocol suffix and any leading host IP.
                let text = text.split('/').next().unwrap_or(text);
                let parts: Vec<&str> = text.split(':').collect();
                match parts.as_slice() {
                    [_ip, host, container] => PortMapping::parse(&format!("{host}:{container}")),
                    _ => PortMapping::parse(text),
                }
            }
        }
    }
}

/// Parses compose YAML text.
///
/// # Errors
///
/// Returns a `Config` error when the YAML is malformed.
pub fn parse_compose(text: &str) -> Result<ComposeFile> {
    serde_yaml::from_str(text).map_err(|e| ShipshapeError::Config {
        message: format!("invalid compose file: {e}"),
    })
}

/// Statically validates a composition against the audit's expectations.
///
/// # Checks performed
///
/// 1. At least one service is defined.
/// 2. The API service exists.
/// 3. The API service has an artifact source (image or build).
/// 4. The API service publishes the expected container port.
///
/// # Errors
///
/// Returns an error describing the first failed check.
pub fn validate_compose(file: &ComposeFile, api_service: &str, service_port: u16) -> Result<()> {
    tracing::debug!(services = file.services.len(), "validating compose file");
    if file.services.is_empty() {
        return Err(ShipshapeError::Config {
            message: "compose file defines no services".into(),
        });
    }

    let api = file
        .services
        .get(api_service)
        .ok_or_else(|| ShipshapeError::NotFound {
            kind: "service",
            id: api_service.to_owned(),
        })?;

    if !api.has_source() {
        return Err(ShipshapeError::Config {
            message: format!("service \"{api_service}\" has neither image nor build"),
        });
    }

    if !api
        .port_mappings()
        .iter()
        .any(|m| m.container == service_port)
    {
        return Err(ShipshapeError::Config {
            message: format!(
                "service \"{api_service}\" does not publish container port {service_port}"
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPOSE_YAML: &str = r#"
services:
  api:
    build: .
    ports:
      - "5000:5000"
    environment:
      - REDIS_URL=redis://redis:6379
    depends_on:
      - redis
    restart: unless-stopped
  redis:
    image: redis:7-alpine
    ports:
      - "6379"
"#;

    #[test]
    fn parses_typical_compose_file() {
        let file = parse_compose(COMPOSE_YAML).expect("should parse");
        assert_eq!(file.services.len(), 2);
        let api = &file.services["api"];
        assert!(api.has_source());
        assert!(matches!(api.build, Some(BuildSpec::Context(_))));
        assert_eq!(
            api.port_mappings(),
            vec![PortMapping {
                host: 5000,
                container: 5000
            }]
        );
        assert_eq!(file.services["redis"].image.as_deref(), Some("redis:7-alpine"));
    }

    #[test]
    fn validates_typical_compose_file() {
        let file = parse_compose(COMPOSE_YAML).expect("should parse");
        assert!(validate_compose(&file, "api", 5000).is_ok());
    }

    #[test]
    fn long_form_build_parses() {
        let yaml = "services:\n  api:\n    build:\n      context: .\n      dockerfile: Dockerfile\n    ports: [\"5000:5000\"]\n";
        let file = parse_compose(yaml).expect("should parse");
        assert!(matches!(
            file.services["api"].build,
            Some(BuildSpec::Detailed { .. })
        ));
        assert!(validate_compose(&file, "api", 5000).is_ok());
    }

    #[test]
    fn numeric_port_entry_maps_both_sides() {
        let entry = PortEntry::Number(8080);
        assert_eq!(
            entry.mapping().expect("should map"),
            PortMapping {
                host: 8080,
                container: 8080
            }
        );
    }

    #[test]
    fn host_ip_prefix_is_stripped() {
        let entry = PortEntry::Text("127.0.0.1:5001:5000".into());
        let mapping = entry.mapping().expect("should map");
        assert_eq!(mapping.host, 5001);
        assert_eq!(mapping.container, 5000);
    }

    #[test]
    fn empty_services_fails_validation() {
        let file = parse_compose("services: {}\n").expect("should parse");
        let err = validate_compose(&file, "api", 5000).unwrap_err();
        assert!(err.to_string().contains("no services"), "got: {err}");
    }

    #[test]
    fn missing_api_service_fails_validation() {
        let yaml = "services:\n  redis:\n    image: redis:7\n";
        let file = parse_compose(yaml).expect("should parse");
        let err = validate_compose(&file, "api", 5000).unwrap_err();
        assert!(err.to_string().contains("service not found"), "got: {err}");
    }

    #[test]
    fn missing_port_fails_validation() {
        let yaml = "services:\n  api:\n    build: .\n";
        let file = parse_compose(yaml).expect("should parse");
        let err = validate_compose(&file, "api", 5000).unwrap_err();
        assert!(err.to_string().contains("port 5000"), "got: {err}");
    }

    #[test]
    fn malformed_yaml_is_config_error() {
        let err = parse_compose("services: [not: a map").unwrap_err();
        assert!(err.to_string().contains("invalid compose file"), "got: {err}");
    }
}
