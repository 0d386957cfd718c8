//! Lifecycle driver behaviour against an in-memory runtime.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, stream};
use proptest::prelude::*;
use tugboat::driver::container_spec;
use tugboat::runtime::{
    ContainerCreated, ContainerExit, ContainerRuntime, ContainerSpec, LogChunk, LogOptions,
    LogStream, PortMapping, ProgressStream, RuntimeError, RuntimeResult, WaitCondition,
};
use tugboat::{LifecycleDriver, RunConfig};
use tugboat_common::{ContainerHandle, TugboatError};
use tugboat_image::{ImageReference, RegistryAuth};

const CONTAINER_ID: &str = "4f66ad9a0b2e5d1c8b7a6e3f2d1c0b9a8f7e6d5c4b3a2f1e0d9c8b7a6f5e4d3c";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Pull { image: String, auth: RegistryAuth },
    Create(ContainerSpec),
    Start(String),
    Wait(String, WaitCondition),
    Logs(String, LogOptions),
}

/// Scripted runtime that records every call it receives.
struct FakeRuntime {
    calls: Mutex<Vec<Call>>,
    progress: Vec<RuntimeResult<&'static str>>,
    create: RuntimeResult<()>,
    start: RuntimeResult<()>,
    wait: RuntimeResult<ContainerExit>,
    logs: Vec<RuntimeResult<LogChunk>>,
}

impl Default for FakeRuntime {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            progress: vec![
                Ok("{\"status\":\"Pulling from acme/app\",\"id\":\"1.0\"}\n"),
                Ok("{\"status\":\"Download complete\",\"id\":\"a3ed95caeb02\"}\n"),
            ],
            create: Ok(()),
            start: Ok(()),
            wait: Ok(ContainerExit::with_code(0)),
            logs: vec![
                Ok(LogChunk::stdout("listening on :8080\n")),
                Ok(LogChunk::stderr("warn: no config\n")),
                Ok(LogChunk::stdout("shutting down\n")),
            ],
        }
    }
}

impl FakeRuntime {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    fn pull_image(&self, image: &ImageReference, auth: &RegistryAuth) -> ProgressStream {
        self.record(Call::Pull {
            image: image.to_string(),
            auth: auth.clone(),
        });
        let items: Vec<_> = self
            .progress
            .iter()
            .map(|item| item.clone().map(|s| Bytes::from_static(s.as_bytes())))
            .collect();
        stream::iter(items).boxed()
    }

    async fn create_container(&self, spec: &ContainerSpec) -> RuntimeResult<ContainerCreated> {
        self.record(Call::Create(spec.clone()));
        self.create.clone()?;
        Ok(ContainerCreated {
            handle: ContainerHandle::new(CONTAINER_ID).unwrap(),
            warnings: vec!["memory limit ignored".to_string()],
        })
    }

    async fn start_container(&self, handle: &ContainerHandle) -> RuntimeResult<()> {
        self.record(Call::Start(handle.to_string()));
        self.start.clone()
    }

    async fn wait_container(
        &self,
        handle: &ContainerHandle,
        condition: WaitCondition,
    ) -> RuntimeResult<ContainerExit> {
        self.record(Call::Wait(handle.to_string(), condition));
        self.wait.clone()
    }

    fn fetch_logs(&self, handle: &ContainerHandle, options: LogOptions) -> LogStream {
        self.record(Call::Logs(handle.to_string(), options));
        stream::iter(self.logs.clone()).boxed()
    }
}

fn config() -> RunConfig {
    RunConfig::new(Some("robot"), Some("s3cr3t"), Some("ghcr.io/acme/app:1.0")).unwrap()
}

struct Outcome {
    result: Result<tugboat::RunReport, TugboatError>,
    calls: Vec<Call>,
    stdout: String,
    stderr: String,
}

async fn run(runtime: FakeRuntime) -> Outcome {
    let driver = LifecycleDriver::new(runtime);
    let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
    let result = driver.run(&config(), &mut stdout, &mut stderr).await;

    Outcome {
        result,
        calls: driver.runtime().calls(),
        stdout: String::from_utf8(stdout).unwrap(),
        stderr: String::from_utf8(stderr).unwrap(),
    }
}

fn step_names(calls: &[Call]) -> Vec<&'static str> {
    calls
        .iter()
        .map(|call| match call {
            Call::Pull { .. } => "pull",
            Call::Create(_) => "create",
            Call::Start(_) => "start",
            Call::Wait(..) => "wait",
            Call::Logs(..) => "logs",
        })
        .collect()
}

#[test_log::test(tokio::test)]
async fn successful_run_calls_each_step_once_in_order() {
    let outcome = run(FakeRuntime::default()).await;

    let report = outcome.result.unwrap();
    assert_eq!(report.container.as_str(), CONTAINER_ID);
    assert_eq!(report.exit, ContainerExit::with_code(0));
    assert_eq!(
        step_names(&outcome.calls),
        ["pull", "create", "start", "wait", "logs"]
    );

    assert_eq!(
        outcome.calls[3],
        Call::Wait(CONTAINER_ID.to_string(), WaitCondition::NotRunning)
    );
    assert_eq!(
        outcome.calls[4],
        Call::Logs(CONTAINER_ID.to_string(), LogOptions::combined())
    );
}

#[test_log::test(tokio::test)]
async fn progress_then_logs_reach_the_console() {
    let outcome = run(FakeRuntime::default()).await;
    let report = outcome.result.unwrap();

    assert_eq!(
        outcome.stdout,
        "{\"status\":\"Pulling from acme/app\",\"id\":\"1.0\"}\n\
         {\"status\":\"Download complete\",\"id\":\"a3ed95caeb02\"}\n\
         listening on :8080\n\
         shutting down\n"
    );
    assert_eq!(outcome.stderr, "warn: no config\n");
    assert_eq!(report.stdout_bytes, 33);
    assert_eq!(report.stderr_bytes, 16);
}

#[tokio::test]
async fn pull_carries_encoded_credentials() {
    let outcome = run(FakeRuntime::default()).await;

    let Call::Pull { image, auth } = &outcome.calls[0] else {
        panic!("first call was {:?}", outcome.calls[0]);
    };
    assert_eq!(image, "ghcr.io/acme/app:1.0");

    let credential = auth.decode().unwrap();
    assert_eq!(credential.username, "robot");
    assert_eq!(credential.registry_token, "s3cr3t");
}

#[tokio::test]
async fn create_always_requests_service_port() {
    let outcome = run(FakeRuntime::default()).await;

    let Call::Create(spec) = &outcome.calls[1] else {
        panic!("second call was {:?}", outcome.calls[1]);
    };
    assert_eq!(spec.image, "ghcr.io/acme/app:1.0");
    assert_eq!(spec.ports.len(), 1);
    assert_eq!(spec.ports[0].key(), "8080/tcp");
    assert_eq!(spec.ports[0].host_ip, "0.0.0.0");
    assert_eq!(spec.ports[0].host_port, 8080);
}

#[tokio::test]
async fn pull_failure_stops_before_create() {
    let runtime = FakeRuntime {
        progress: vec![
            Ok("{\"status\":\"Pulling from acme/app\"}\n"),
            Err(RuntimeError::new("manifest unknown")),
        ],
        ..FakeRuntime::default()
    };
    let outcome = run(runtime).await;

    let err = outcome.result.unwrap_err();
    assert!(matches!(err, TugboatError::Pull { ref message, .. } if message == "manifest unknown"));
    assert_eq!(
        err.to_string(),
        "Error pulling image ghcr.io/acme/app:1.0: manifest unknown"
    );
    assert_eq!(step_names(&outcome.calls), ["pull"]);
    // Progress received before the failure was still forwarded.
    assert_eq!(outcome.stdout, "{\"status\":\"Pulling from acme/app\"}\n");
}

#[tokio::test]
async fn create_failure_is_fatal() {
    let runtime = FakeRuntime {
        create: Err(RuntimeError::new(
            "Bind for 0.0.0.0:8080 failed: port is already allocated",
        )),
        ..FakeRuntime::default()
    };
    let outcome = run(runtime).await;

    assert!(matches!(
        outcome.result,
        Err(TugboatError::Create { ref message }) if message.contains("already allocated")
    ));
    assert_eq!(step_names(&outcome.calls), ["pull", "create"]);
}

#[tokio::test]
async fn start_failure_leaves_container_in_place() {
    let runtime = FakeRuntime {
        start: Err(RuntimeError::new("exec: \"/app\": no such file or directory")),
        ..FakeRuntime::default()
    };
    let outcome = run(runtime).await;

    assert!(matches!(
        outcome.result,
        Err(TugboatError::Start { ref container, .. }) if container == CONTAINER_ID
    ));
    // No stop or remove: the trait has no such calls and nothing else ran.
    assert_eq!(step_names(&outcome.calls), ["pull", "create", "start"]);
}

#[tokio::test]
async fn wait_error_skips_logs() {
    let runtime = FakeRuntime {
        wait: Err(RuntimeError::new("connection reset by peer")),
        ..FakeRuntime::default()
    };
    let outcome = run(runtime).await;

    assert!(matches!(outcome.result, Err(TugboatError::Wait { .. })));
    assert_eq!(
        step_names(&outcome.calls),
        ["pull", "create", "start", "wait"]
    );
    assert!(outcome.stderr.is_empty());
}

#[tokio::test]
async fn non_zero_exit_is_a_status() {
    let runtime = FakeRuntime {
        wait: Ok(ContainerExit {
            status_code: 3,
            message: Some("exit status 3".to_string()),
        }),
        ..FakeRuntime::default()
    };
    let outcome = run(runtime).await;

    let report = outcome.result.unwrap();
    assert_eq!(report.exit.status_code, 3);
    assert_eq!(step_names(&outcome.calls).last(), Some(&"logs"));
}

#[tokio::test]
async fn log_failure_is_fatal_after_partial_output() {
    let runtime = FakeRuntime {
        logs: vec![
            Ok(LogChunk::stdout("first\n")),
            Err(RuntimeError::new("unexpected EOF")),
        ],
        ..FakeRuntime::default()
    };
    let outcome = run(runtime).await;

    assert!(matches!(outcome.result, Err(TugboatError::Logs { .. })));
    assert!(outcome.stdout.ends_with("first\n"));
}

#[tokio::test]
async fn log_order_is_kept_per_channel() {
    let logs = (0..20)
        .map(|i| {
            Ok(if i % 3 == 0 {
                LogChunk::stderr(format!("err {i}\n"))
            } else {
                LogChunk::stdout(format!("out {i}\n"))
            })
        })
        .collect();
    let runtime = FakeRuntime {
        progress: Vec::new(),
        logs,
        ..FakeRuntime::default()
    };
    let outcome = run(runtime).await;
    outcome.result.unwrap();

    let expected_out: String = (0..20)
        .filter(|i| i % 3 != 0)
        .map(|i| format!("out {i}\n"))
        .collect();
    let expected_err: String = (0..20)
        .filter(|i| i % 3 == 0)
        .map(|i| format!("err {i}\n"))
        .collect();
    assert_eq!(outcome.stdout, expected_out);
    assert_eq!(outcome.stderr, expected_err);
}

proptest! {
    #[test]
    fn service_port_is_requested_for_any_image(
        image in "([a-z0-9]{1,8}\\.[a-z]{2,3}/)?[a-z][a-z0-9]{0,10}(/[a-z0-9]{1,8})?(:[a-z0-9.]{1,6})?"
    ) {
        let config = RunConfig::new(Some("robot"), Some("tok"), Some(&image)).unwrap();
        let spec = container_spec(&config);

        prop_assert_eq!(spec.image, image);
        prop_assert_eq!(spec.ports, vec![PortMapping::service()]);
    }
}
