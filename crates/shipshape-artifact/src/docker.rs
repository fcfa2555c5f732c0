//! Deadline-bounded wrapper around the external build tool.
//!
//! All invocations go through [`DockerCli::run`], which drains the child's
//! pipes on background threads and polls the process against a deadline,
//! so a hung build can never wedge the audit.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use shipshape_common::constants::{APP_NAME, TOOL_TIMEOUT_SECS};
use shipshape_common::error::{Result, ShipshapeError};
use shipshape_common::types::PortMapping;

use crate::metadata::ImageMetadata;

/// Captured result of a tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ToolOutput {
    /// The first non-empty line of stderr, for one-line diagnostics.
    #[must_use]
    pub fn first_error_line(&self) -> &str {
        self.stderr
            .lines()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("(no diagnostic output)")
    }
}

/// Handle to a discovered `docker` binary.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: PathBuf,
}

impl DockerCli {
    /// Locates the build tool on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns a `Tool` error when no `docker` binary is installed.
    pub fn discover() -> Result<Self> {
        let binary = which::which("docker").map_err(|e| ShipshapeError::Tool {
            message: format!("docker binary not found on PATH: {e}"),
        })?;
        tracing::debug!(binary = %binary.display(), "discovered build tool");
        Ok(Self { binary })
    }

    /// Creates a wrapper around an explicit binary path (tests).
    #[must_use]
    pub fn with_binary(binary: PathBuf) -> Self {
        Self { binary }
    }

    /// Returns the tool's version string.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be invoked.
    pub fn version(&self) -> Result<String> {
        let output = self.run(&["--version"], Duration::from_secs(5), "version query")?;
        if !output.success {
            return Err(ShipshapeError::Tool {
                message: format!("docker --version failed: {}", output.first_error_line()),
            });
        }
        Ok(output.stdout.trim().to_owned())
    }

    /// Builds an image from a recipe in `context`, tagging it `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error when the build fails or exceeds `timeout`.
    pub fn build(
        &self,
        context: &Path,
        recipe_file: &str,
        tag: &str,
        timeout: Duration,
    ) -> Result<()> {
        tracing::info!(tag, context = %context.display(), "building image");
        let context_arg = context.to_string_lossy();
        let recipe_path = context.join(recipe_file);
        let recipe_arg = recipe_path.to_string_lossy();
        let output = self.run(
            &["build", "-t", tag, "-f", &recipe_arg, &context_arg],
            timeout,
            "image build",
        )?;
        if !output.success {
            return Err(ShipshapeError::Tool {
                message: format!("build failed: {}", output.first_error_line()),
            });
        }
        Ok(())
    }

    /// Inspects a built image and returns its metadata.
    ///
    /// # Errors
    ///
    /// Returns an error when the image is missing or the output is
    /// malformed.
    pub fn inspect_image(&self, tag: &str) -> Result<ImageMetadata> {
        let output = self.run(
            &["image", "inspect", tag],
            Duration::from_secs(TOOL_TIMEOUT_SECS),
            "image inspect",
        )?;
        if !output.success {
            return Err(ShipshapeError::NotFound {
                kind: "image",
                id: tag.to_owned(),
            });
        }
        ImageMetadata::from_inspect_json(&output.stdout)
    }

    /// Starts a detached container from `tag` with one published port.
    ///
    /// # Errors
    ///
    /// Returns an error when the container fails to start.
    pub fn run_detached(&self, tag: &str, name: &str, ports: PortMapping) -> Result<()> {
        tracing::info!(tag, name, %ports, "starting probe container");
        let ports_arg = ports.to_string();
        let output = self.run(
            &["run", "-d", "--name", name, "-p", &ports_arg, tag],
            Duration::from_secs(TOOL_TIMEOUT_SECS),
            "container start",
        )?;
        if !output.success {
            return Err(ShipshapeError::Tool {
                message: format!("container failed to start: {}", output.first_error_line()),
            });
        }
        Ok(())
    }

    /// Force-removes a container, ignoring its current state.
    ///
    /// # Errors
    ///
    /// Returns an error only when the tool itself cannot be invoked;
    /// a missing container is not an error.
    pub fn remove_container(&self, name: &str) -> Result<()> {
        let _ = self.run(
            &["rm", "-f", name],
            Duration::from_secs(TOOL_TIMEOUT_SECS),
            "container removal",
        )?;
        Ok(())
    }

    /// Removes a throwaway image tag.
    ///
    /// # Errors
    ///
    /// Returns an error only when the tool itself cannot be invoked.
    pub fn remove_image(&self, tag: &str) -> Result<()> {
        let _ = self.run(
            &["rmi", "-f", tag],
            Duration::from_secs(TOOL_TIMEOUT_SECS),
            "image removal",
        )?;
        Ok(())
    }

    /// Force-removes every container whose name starts with `prefix`.
    ///
    /// Used by interrupt handlers to clean up throwaway probe containers.
    ///
    /// # Errors
    ///
    /// Returns an error only when the tool itself cannot be invoked.
    pub fn remove_matching(&self, prefix: &str) -> Result<()> {
        let filter = format!("name={prefix}");
        let output = self.run(
            &["ps", "-aq", "--filter", &filter],
            Duration::from_secs(TOOL_TIMEOUT_SECS),
            "container cleanup",
        )?;
        for id in output.stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.remove_container(id)?;
        }
        Ok(())
    }

    /// Starts a compose project detached, waiting for services to be
    /// healthy.
    ///
    /// # Errors
    ///
    /// Returns an error when startup fails or times out.
    pub fn compose_up(&self, project_dir: &Path, timeout: Duration) -> Result<()> {
        tracing::info!(dir = %project_dir.display(), "starting compose project");
        let output = self.run_in(
            project_dir,
            &["compose", "up", "-d", "--wait"],
            timeout,
            "compose up",
        )?;
        if !output.success {
            return Err(ShipshapeError::Tool {
                message: format!("compose startup failed: {}", output.first_error_line()),
            });
        }
        Ok(())
    }

    /// Tears down a compose project and its volumes.
    ///
    /// # Errors
    ///
    /// Returns an error only when the tool itself cannot be invoked.
    pub fn compose_down(&self, project_dir: &Path) -> Result<()> {
        let _ = self.run_in(
            project_dir,
            &["compose", "down", "-v", "--remove-orphans"],
            Duration::from_secs(60),
            "compose down",
        )?;
        Ok(())
    }

    /// Runs the tool with `args`, enforcing `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `Tool` when the process cannot be spawned and `Timeout`
    /// when the deadline passes; a non-zero exit is reported through
    /// [`ToolOutput::success`], not as an error.
    pub fn run(&self, args: &[&str], timeout: Duration, operation: &'static str) -> Result<ToolOutput> {
        self.spawn_bounded(None, args, timeout, operation)
    }

    fn run_in(
        &self,
        dir: &Path,
        args: &[&str],
        timeout: Duration,
        operation: &'static str,
    ) -> Result<ToolOutput> {
        self.spawn_bounded(Some(dir), args, timeout, operation)
    }

    fn spawn_bounded(
        &self,
        dir: Option<&Path>,
        args: &[&str],
        timeout: Duration,
        operation: &'static str,
    ) -> Result<ToolOutput> {
        tracing::debug!(?args, ?timeout, "invoking build tool");
        let mut command = Command::new(&self.binary);
        let _ = command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = dir {
            let _ = command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| ShipshapeError::Tool {
            message: format!("failed to spawn {}: {e}", self.binary.display()),
        })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ShipshapeError::Timeout {
                            operation,
                            seconds: timeout.as_secs(),
                        });
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    return Err(ShipshapeError::Tool {
                        message: format!("failed to wait for {operation}: {e}"),
                    });
                }
            }
        };

        Ok(ToolOutput {
            success: status.success(),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }
}

fn drain<R: Read + Send + 'static>(stream: Option<R>) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buffer = String::new();
        if let Some(mut stream) = stream {
            let _ = stream.read_to_string(&mut buffer);
        }
        buffer
    })
}

/// Generates a collision-free name for a throwaway image or container.
#[must_use]
pub fn throwaway_name(kind: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{APP_NAME}-{kind}-{}", &suffix[..12])
}
