//! [`ContainerRuntime`] over the Docker Engine API.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::Docker;
use bollard::auth::DockerCredentials;
use bollard::container::{
    Config, CreateContainerOptions, LogOutput, LogsOptions, StartContainerOptions,
    WaitContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::image::CreateImageOptions;
use bollard::models::{ContainerWaitResponse, CreateImageInfo, HostConfig, PortBinding};
use bytes::Bytes;
use futures::{StreamExt, stream};
use tugboat_common::{ContainerHandle, TugboatError, TugboatResult};
use tugboat_image::{ImageReference, RegistryAuth};

use super::{
    ContainerCreated, ContainerExit, ContainerRuntime, ContainerSpec, LogChunk, LogOptions,
    LogStream, PortMapping, ProgressStream, RuntimeError, RuntimeResult, WaitCondition,
};

impl From<DockerError> for RuntimeError {
    fn from(err: DockerError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<LogOutput> for LogChunk {
    fn from(output: LogOutput) -> Self {
        match output {
            LogOutput::StdErr { message } => Self::stderr(message),
            // TTY and stdin frames go to stdout, as the Docker CLI does.
            LogOutput::StdOut { message }
            | LogOutput::StdIn { message }
            | LogOutput::Console { message } => Self::stdout(message),
        }
    }
}

/// Re-serialize one pull progress message as a newline-terminated JSON line.
fn progress_line(info: &CreateImageInfo) -> RuntimeResult<Bytes> {
    let mut line = serde_json::to_vec(info)?;
    line.push(b'\n');
    Ok(Bytes::from(line))
}

/// Turn the first signal of a wait stream into an exit status.
///
/// bollard reports a non-zero exit as [`DockerError::DockerContainerWaitError`];
/// that is still a status. Any other error, or a stream that closes without a
/// signal, is a wait failure.
fn exit_from_signal(
    signal: Option<Result<ContainerWaitResponse, DockerError>>,
) -> RuntimeResult<ContainerExit> {
    match signal {
        Some(Ok(response)) => Ok(ContainerExit {
            status_code: response.status_code,
            message: response.error.and_then(|e| e.message),
        }),
        Some(Err(DockerError::DockerContainerWaitError { error, code })) => Ok(ContainerExit {
            status_code: code,
            message: Some(error).filter(|m| !m.is_empty()),
        }),
        Some(Err(err)) => Err(err.into()),
        None => Err(RuntimeError::new("wait stream closed without a status")),
    }
}

/// Docker daemon client.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect using the environment (`DOCKER_HOST` and friends, else the
    /// local socket) and negotiate the API version with the daemon.
    ///
    /// # Errors
    ///
    /// Returns [`TugboatError::Client`] if the client cannot be built or the
    /// daemon does not answer the version request.
    pub async fn connect() -> TugboatResult<Self> {
        let client_error = |e: DockerError| TugboatError::Client {
            message: e.to_string(),
        };

        let docker = Docker::connect_with_defaults().map_err(client_error)?;
        let docker = docker.negotiate_version().await.map_err(client_error)?;

        tracing::debug!(api_version = ?docker.client_version(), "Connected to Docker daemon");
        Ok(Self { docker })
    }

    fn credentials(auth: &RegistryAuth) -> RuntimeResult<DockerCredentials> {
        let credential = auth
            .decode()
            .map_err(|e| RuntimeError::new(e.to_string()))?;

        let non_empty = |s: String| Some(s).filter(|s| !s.is_empty());
        Ok(DockerCredentials {
            username: non_empty(credential.username),
            registrytoken: non_empty(credential.registry_token),
            ..Default::default()
        })
    }

    fn container_config(spec: &ContainerSpec) -> Config<String> {
        let mut exposed_ports = HashMap::new();
        let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();

        for mapping in &spec.ports {
            let PortMapping {
                host_ip, host_port, ..
            } = mapping;

            exposed_ports.insert(mapping.key(), HashMap::new());
            port_bindings
                .entry(mapping.key())
                .or_default()
                .get_or_insert_with(Vec::new)
                .push(PortBinding {
                    host_ip: Some(host_ip.clone()),
                    host_port: Some(host_port.to_string()),
                });
        }

        Config {
            image: Some(spec.image.clone()),
            exposed_ports: Some(exposed_ports),
            host_config: Some(HostConfig {
                port_bindings: Some(port_bindings),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    fn pull_image(&self, image: &ImageReference, auth: &RegistryAuth) -> ProgressStream {
        let credentials = match Self::credentials(auth) {
            Ok(credentials) => credentials,
            Err(err) => return stream::once(async move { Err(err) }).boxed(),
        };

        let (from_image, tag) = image.pull_target();
        tracing::debug!(%from_image, %tag, "Requesting image pull");

        let options = CreateImageOptions {
            from_image,
            tag,
            ..Default::default()
        };

        self.docker
            .create_image(Some(options), None, Some(credentials))
            .map(|item| -> RuntimeResult<Bytes> { progress_line(&item?) })
            .boxed()
    }

    async fn create_container(&self, spec: &ContainerSpec) -> RuntimeResult<ContainerCreated> {
        let response = self
            .docker
            .create_container(
                None::<CreateContainerOptions<String>>,
                Self::container_config(spec),
            )
            .await?;

        let handle =
            ContainerHandle::new(response.id).map_err(|e| RuntimeError::new(e.to_string()))?;

        Ok(ContainerCreated {
            handle,
            warnings: response.warnings,
        })
    }

    async fn start_container(&self, handle: &ContainerHandle) -> RuntimeResult<()> {
        self.docker
            .start_container(handle.as_str(), None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn wait_container(
        &self,
        handle: &ContainerHandle,
        condition: WaitCondition,
    ) -> RuntimeResult<ContainerExit> {
        let options = WaitContainerOptions {
            condition: condition.as_str(),
        };
        let mut signals = self.docker.wait_container(handle.as_str(), Some(options)).boxed();

        exit_from_signal(signals.next().await)
    }

    fn fetch_logs(&self, handle: &ContainerHandle, options: LogOptions) -> LogStream {
        let options = LogsOptions::<String> {
            stdout: options.stdout,
            stderr: options.stderr,
            ..Default::default()
        };

        self.docker
            .logs(handle.as_str(), Some(options))
            .map(|item| item.map(LogChunk::from).map_err(RuntimeError::from))
            .boxed()
    }
}
