//! Domain primitive types used across the shipshape workspace.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A container image reference: `name[:tag][@digest]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef(String);

impl ImageRef {
    /// Creates an image reference from a string value.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the repository part, without tag or digest.
    ///
    /// A digest separator (`@`) binds tighter than a tag separator; a `:`
    /// inside a registry host:port prefix is not a tag separator.
    #[must_use]
    pub fn repository(&self) -> &str {
        let without_digest = self.0.split('@').next().unwrap_or(&self.0);
        match without_digest.rsplit_once(':') {
            Some((repo, rest)) if !rest.contains('/') => repo,
            _ => without_digest,
        }
    }

    /// Returns the tag, if one is present.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        let without_digest = self.0.split('@').next().unwrap_or(&self.0);
        match without_digest.rsplit_once(':') {
            Some((_, rest)) if !rest.contains('/') => Some(rest),
            _ => None,
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SHA-256 digest used to fingerprint recipes for report identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Computes the digest of a byte slice.
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Creates a digest from a hex-encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid 64-character hex string.
    pub fn from_hex(hex: impl Into<String>) -> crate::error::Result<Self> {
        let hex = hex.into();
        if hex.len() != crate::constants::SHA256_HEX_LENGTH
            || !hex.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(crate::error::ShipshapeError::Config {
                message: format!("invalid SHA-256 hex string: {hex}"),
            });
        }
        Ok(Self(hex))
    }

    /// Returns the hex-encoded digest string.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.0)
    }
}

/// A published port mapping (`host:container`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortMapping {
    /// Port bound on the host.
    pub host: u16,
    /// Port listened on inside the container.
    pub container: u16,
}

impl PortMapping {
    /// Parses a `host:container` mapping string.
    ///
    /// A bare `port` maps the same port on both sides.
    ///
    /// # Errors
    ///
    /// Returns an error if either side is not a valid port number.
    pub fn parse(spec: &str) -> crate::error::Result<Self> {
        let invalid = |_| crate::error::ShipshapeError::Config {
            message: format!("invalid port mapping: {spec}"),
        };
        match spec.split_once(':') {
            Some((host, container)) => Ok(Self {
                host: host.trim().parse().map_err(invalid)?,
                container: container.trim().parse().map_err(invalid)?,
            }),
            None => {
                let port: u16 = spec.trim().parse().map_err(invalid)?;
                Ok(Self {
                    host: port,
                    container: port,
                })
            }
        }
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_ref_splits_tag() {
        let img = ImageRef::new("python:3.12-slim");
        assert_eq!(img.repository(), "python");
        assert_eq!(img.tag(), Some("3.12-slim"));
    }

    #[test]
    fn image_ref_without_tag() {
        let img = ImageRef::new("redis");
        assert_eq!(img.repository(), "redis");
        assert_eq!(img.tag(), None);
    }

    #[test]
    fn image_ref_with_registry_port() {
        let img = ImageRef::new("localhost:5000/app");
        assert_eq!(img.repository(), "localhost:5000/app");
        assert_eq!(img.tag(), None);
    }

    #[test]
    fn image_ref_ignores_digest() {
        let img = ImageRef::new("python:3.12-slim@sha256:abcd");
        assert_eq!(img.repository(), "python");
        assert_eq!(img.tag(), Some("3.12-slim"));
    }

    #[test]
    fn digest_of_bytes_is_stable() {
        let a = Sha256Digest::of_bytes(b"FROM python:3.12-slim\n");
        let b = Sha256Digest::of_bytes(b"FROM python:3.12-slim\n");
        assert_eq!(a, b);
        assert_eq!(a.as_hex().len(), 64);
    }

    #[test]
    fn digest_rejects_short_hex() {
        assert!(Sha256Digest::from_hex("abc123").is_err());
    }

    #[test]
    fn port_mapping_parses_pair() {
        let m = PortMapping::parse("5000:5000").expect("should parse");
        assert_eq!(m.host, 5000);
        assert_eq!(m.container, 5000);
    }

    #[test]
    fn port_mapping_parses_bare_port() {
        let m = PortMapping::parse("8080").expect("should parse");
        assert_eq!(m, PortMapping { host: 8080, container: 8080 });
    }

    #[test]
    fn port_mapping_rejects_garbage() {
        assert!(PortMapping::parse("abc:def").is_err());
        assert!(PortMapping::parse("70000:80").is_err());
    }
}
