//! Unified error types for the shipshape workspace.
//!
//! Higher-level crates wrap these variants rather than defining parallel
//! enums; audit checks convert them into failed check results instead of
//! propagating, so the report is always complete.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum ShipshapeError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A build recipe failed to parse.
    #[error("recipe parse error at line {line}: {message}")]
    Parse {
        /// 1-based source line where parsing failed.
        line: usize,
        /// Description of the syntax error.
        message: String,
    },

    /// An external tool invocation failed or the tool is unavailable.
    #[error("build tool error: {message}")]
    Tool {
        /// Description of the tool failure.
        message: String,
    },

    /// An external tool did not finish within its deadline.
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        /// Operation that exceeded its deadline.
        operation: &'static str,
        /// Deadline in seconds.
        seconds: u64,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl ShipshapeError {
    /// Wraps an I/O error with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ShipshapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_line() {
        let err = ShipshapeError::Parse {
            line: 7,
            message: "unknown instruction FORM".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 7"), "got: {msg}");
        assert!(msg.contains("FORM"), "got: {msg}");
    }

    #[test]
    fn timeout_error_names_operation() {
        let err = ShipshapeError::Timeout {
            operation: "image build",
            seconds: 300,
        };
        assert_eq!(err.to_string(), "image build timed out after 300s");
    }
}
