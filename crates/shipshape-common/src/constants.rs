//! System-wide constants and default values.

/// Default recipe file name looked up in the project directory.
pub const RECIPE_FILE: &str = "Dockerfile";

/// Default ignore-file name looked up next to the recipe.
pub const IGNORE_FILE: &str = ".dockerignore";

/// Compose file names probed in order.
pub const COMPOSE_FILES: &[&str] = &["docker-compose.yml", "docker-compose.yaml", "compose.yml"];

/// Optional project-level configuration file.
pub const CONFIG_FILE: &str = "shipshape.json";

/// Maximum artifact size accepted by the size check, in bytes.
///
/// Decimal megabytes, matching how the build tool reports image sizes.
/// The boundary is inclusive: an artifact of exactly this size passes.
pub const MAX_IMAGE_SIZE_BYTES: u64 = 200 * 1_000_000;

/// Base-image name fragments accepted by the slim-base check.
pub const SLIM_BASE_MARKERS: &[&str] = &["slim", "alpine", "distroless"];

/// Account names treated as the default privileged user.
pub const ROOT_USERS: &[&str] = &["root", "0"];

/// Health endpoint path probed on a running container.
pub const HEALTH_PATH: &str = "/health";

/// Container port the probed service is expected to listen on.
pub const DEFAULT_SERVICE_PORT: u16 = 5000;

/// Host port used when running the throwaway probe container.
pub const DEFAULT_PROBE_HOST_PORT: u16 = 5001;

/// Compose service name expected to front the API.
pub const DEFAULT_API_SERVICE: &str = "api";

/// Deadline for an image build, in seconds.
pub const BUILD_TIMEOUT_SECS: u64 = 300;

/// Deadline for inspect/run/stop tool invocations, in seconds.
pub const TOOL_TIMEOUT_SECS: u64 = 30;

/// Deadline for a single health-probe HTTP attempt, in seconds.
pub const PROBE_TIMEOUT_SECS: u64 = 5;

/// Number of health-probe attempts before giving up.
pub const PROBE_ATTEMPTS: u32 = 5;

/// SHA-256 digest length in hex characters.
pub const SHA256_HEX_LENGTH: usize = 64;

/// Application name used in CLI output and throwaway resource names.
pub const APP_NAME: &str = "shipshape";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "shipshape";
