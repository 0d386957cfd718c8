//! Container runtime capability.
//!
//! The lifecycle driver only ever talks to the runtime through
//! [`ContainerRuntime`], which exposes exactly the five calls a run needs.
//! [`DockerRuntime`] implements it against the Docker Engine API.

mod docker;
pub mod ports;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;
use tugboat_common::ContainerHandle;
use tugboat_image::{ImageReference, RegistryAuth};

pub use docker::DockerRuntime;
pub use ports::PortMapping;

/// Result type for runtime calls.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Pull progress, one chunk per message, in the order the runtime sent them.
pub type ProgressStream = BoxStream<'static, RuntimeResult<Bytes>>;

/// Demultiplexed container log frames.
pub type LogStream = BoxStream<'static, RuntimeResult<LogChunk>>;

/// Error reported by the container runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RuntimeError {
    message: String,
}

impl RuntimeError {
    /// Create an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for RuntimeError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Request to create a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Image to instantiate, as given by the operator.
    pub image: String,
    /// Ports to expose and bind on the host.
    pub ports: Vec<PortMapping>,
}

impl ContainerSpec {
    /// Create a spec for an image with no ports.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ports: Vec::new(),
        }
    }

    /// Add a port mapping.
    #[must_use]
    pub fn with_port(mut self, mapping: PortMapping) -> Self {
        self.ports.push(mapping);
        self
    }
}

/// A freshly created container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerCreated {
    /// Handle for all later calls against this container.
    pub handle: ContainerHandle,
    /// Warnings the runtime attached to the create response.
    pub warnings: Vec<String>,
}

/// State a wait call blocks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WaitCondition {
    /// Any state other than running.
    #[default]
    NotRunning,
}

impl WaitCondition {
    /// Condition name in the Engine API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotRunning => "not-running",
        }
    }
}

/// Terminal status of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerExit {
    /// Exit code of the container's main process.
    pub status_code: i64,
    /// Message the runtime attached to the exit, if any.
    pub message: Option<String>,
}

impl ContainerExit {
    /// An exit with no attached message.
    #[must_use]
    pub const fn with_code(status_code: i64) -> Self {
        Self {
            status_code,
            message: None,
        }
    }
}

/// Which container streams to include in a log fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    /// Include standard output.
    pub stdout: bool,
    /// Include standard error.
    pub stderr: bool,
}

impl LogOptions {
    /// Both output streams.
    #[must_use]
    pub const fn combined() -> Self {
        Self {
            stdout: true,
            stderr: true,
        }
    }
}

/// Origin of a log frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    /// The container's standard output.
    Stdout,
    /// The container's standard error.
    Stderr,
}

/// One frame of container output, tagged with its origin stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogChunk {
    /// Stream the frame came from.
    pub source: LogSource,
    /// Frame payload, untouched.
    pub payload: Bytes,
}

impl LogChunk {
    /// A standard output frame.
    pub fn stdout(payload: impl Into<Bytes>) -> Self {
        Self {
            source: LogSource::Stdout,
            payload: payload.into(),
        }
    }

    /// A standard error frame.
    pub fn stderr(payload: impl Into<Bytes>) -> Self {
        Self {
            source: LogSource::Stderr,
            payload: payload.into(),
        }
    }
}

/// Control-plane calls the lifecycle driver depends on.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Authenticate with the registry and pull an image.
    ///
    /// Request failures surface as the first item of the stream.
    fn pull_image(&self, image: &ImageReference, auth: &RegistryAuth) -> ProgressStream;

    /// Create a container.
    async fn create_container(&self, spec: &ContainerSpec) -> RuntimeResult<ContainerCreated>;

    /// Start a created container.
    async fn start_container(&self, handle: &ContainerHandle) -> RuntimeResult<()>;

    /// Block until the container reaches `condition`.
    ///
    /// Resolves with whichever of status or error the runtime signals first.
    async fn wait_container(
        &self,
        handle: &ContainerHandle,
        condition: WaitCondition,
    ) -> RuntimeResult<ContainerExit>;

    /// Fetch the container's logs.
    fn fetch_logs(&self, handle: &ContainerHandle, options: LogOptions) -> LogStream;
}
