//! # shipshape-artifact
//!
//! Introspection of built container artifacts and their companion files.
//!
//! Handles:
//! - **Docker**: discovery and deadline-bounded invocation of the external
//!   build tool.
//! - **Metadata**: typed view of `image inspect` output (size, user,
//!   health probe, exposed ports).
//! - **Probe**: blocking HTTP probe of a running container's health
//!   endpoint.
//! - **Compose**: typed `docker-compose.yml` model and static validation.

pub mod compose;
pub mod docker;
pub mod metadata;
pub mod probe;

pub use docker::DockerCli;
pub use metadata::ImageMetadata;
