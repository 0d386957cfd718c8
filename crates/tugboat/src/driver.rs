//! Container lifecycle driver.
//!
//! A run is five steps against the runtime, strictly in order and fail-fast:
//! pull, create, start, wait, logs. Nothing is retried and nothing is cleaned
//! up: a container that was created stays in place whatever happens after.

use std::fmt;
use std::io::Write;

use futures::StreamExt;
use tugboat_common::{ContainerHandle, TugboatError, TugboatResult};

use crate::config::RunConfig;
use crate::output::{DemuxTotals, LogDemuxer, ProgressSink};
use crate::runtime::{
    ContainerExit, ContainerRuntime, ContainerSpec, LogOptions, PortMapping, WaitCondition,
};

/// Lifecycle steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Authenticate with the registry and pull the image.
    Pull,
    /// Create the container.
    Create,
    /// Start the container.
    Start,
    /// Wait for the container to stop running.
    Wait,
    /// Fetch and demultiplex the container's logs.
    Logs,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pull => write!(f, "pull"),
            Self::Create => write!(f, "create"),
            Self::Start => write!(f, "start"),
            Self::Wait => write!(f, "wait"),
            Self::Logs => write!(f, "logs"),
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// The container that was created and run.
    pub container: ContainerHandle,
    /// How the container exited.
    pub exit: ContainerExit,
    /// Log bytes written to standard output.
    pub stdout_bytes: u64,
    /// Log bytes written to standard error.
    pub stderr_bytes: u64,
}

/// The create request for a run. The service port mapping is always
/// requested, whatever the image declares.
#[must_use]
pub fn container_spec(config: &RunConfig) -> ContainerSpec {
    ContainerSpec::new(config.image.as_str()).with_port(PortMapping::service())
}

/// Drives one container through pull, create, start, wait and logs.
pub struct LifecycleDriver<R> {
    runtime: R,
}

impl<R: ContainerRuntime> LifecycleDriver<R> {
    /// Create a driver over a runtime.
    pub const fn new(runtime: R) -> Self {
        Self { runtime }
    }

    /// The runtime this driver calls.
    pub const fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Run the full lifecycle.
    ///
    /// Pull progress and container stdout go to `stdout`; container stderr
    /// goes to `stderr`.
    ///
    /// # Errors
    ///
    /// Returns the error of the first step that fails. Later steps are not
    /// attempted.
    #[tracing::instrument(name = "run", skip_all, fields(image = %config.image))]
    pub async fn run<O: Write, E: Write>(
        &self,
        config: &RunConfig,
        stdout: &mut O,
        stderr: &mut E,
    ) -> TugboatResult<RunReport> {
        self.pull(config, &mut *stdout).await?;
        let container = self.create(config).await?;
        self.start(&container).await?;
        let exit = self.wait(&container).await?;
        let totals = self.logs(&container, stdout, stderr).await?;

        tracing::info!(
            container = container.short(),
            status_code = exit.status_code,
            "Run complete"
        );

        Ok(RunReport {
            container,
            exit,
            stdout_bytes: totals.stdout_bytes,
            stderr_bytes: totals.stderr_bytes,
        })
    }

    async fn pull<O: Write>(&self, config: &RunConfig, stdout: O) -> TugboatResult<()> {
        let auth = config.credential.encode()?;
        let pull_error = |message: String| TugboatError::Pull {
            image: config.image.to_string(),
            message,
        };

        let mut progress = self.runtime.pull_image(&config.image, &auth);
        let mut sink = ProgressSink::new(stdout);
        while let Some(chunk) = progress.next().await {
            let chunk = chunk.map_err(|e| pull_error(e.to_string()))?;
            sink.write_chunk(&chunk)?;
        }
        let bytes = sink.finish()?;

        tracing::info!(step = %Step::Pull, progress_bytes = bytes, "Image pulled");
        Ok(())
    }

    async fn create(&self, config: &RunConfig) -> TugboatResult<ContainerHandle> {
        let spec = container_spec(config);
        let created = self
            .runtime
            .create_container(&spec)
            .await
            .map_err(|e| TugboatError::Create {
                message: e.to_string(),
            })?;

        for warning in &created.warnings {
            tracing::warn!(container = created.handle.short(), %warning, "Runtime warning");
        }
        tracing::info!(
            step = %Step::Create,
            container = created.handle.short(),
            ports = ?spec.ports.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Container created"
        );
        Ok(created.handle)
    }

    async fn start(&self, container: &ContainerHandle) -> TugboatResult<()> {
        self.runtime
            .start_container(container)
            .await
            .map_err(|e| TugboatError::Start {
                container: container.to_string(),
                message: e.to_string(),
            })?;

        tracing::info!(step = %Step::Start, container = container.short(), "Container started");
        Ok(())
    }

    async fn wait(&self, container: &ContainerHandle) -> TugboatResult<ContainerExit> {
        let exit = self
            .runtime
            .wait_container(container, WaitCondition::NotRunning)
            .await
            .map_err(|e| TugboatError::Wait {
                container: container.to_string(),
                message: e.to_string(),
            })?;

        if let Some(message) = &exit.message {
            tracing::warn!(container = container.short(), %message, "Container exited with error");
        }
        tracing::info!(
            step = %Step::Wait,
            container = container.short(),
            status_code = exit.status_code,
            "Container stopped"
        );
        Ok(exit)
    }

    async fn logs<O: Write, E: Write>(
        &self,
        container: &ContainerHandle,
        stdout: O,
        stderr: E,
    ) -> TugboatResult<DemuxTotals> {
        let mut frames = self.runtime.fetch_logs(container, LogOptions::combined());
        let mut demux = LogDemuxer::new(stdout, stderr);
        while let Some(chunk) = frames.next().await {
            let chunk = chunk.map_err(|e| TugboatError::Logs {
                container: container.to_string(),
                message: e.to_string(),
            })?;
            demux.write_chunk(&chunk)?;
        }
        let totals = demux.finish()?;

        tracing::info!(
            step = %Step::Logs,
            container = container.short(),
            stdout_bytes = totals.stdout_bytes,
            stderr_bytes = totals.stderr_bytes,
            "Logs streamed"
        );
        Ok(totals)
    }
}
