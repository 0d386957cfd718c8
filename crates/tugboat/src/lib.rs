//! # tugboat
//!
//! Pull a registry image, run it once and collect its output.
//!
//! A run authenticates to the registry, pulls the image, creates a container
//! with port 8080 published on all host interfaces, starts it, waits for it
//! to stop and then streams its logs to the console. Every step is a single
//! call against the container runtime and the first failure ends the run.
//!
//! ## Usage
//!
//! ```no_run
//! use tugboat::{LifecycleDriver, RunConfig, runtime::DockerRuntime};
//!
//! # async fn example() -> tugboat_common::TugboatResult<()> {
//! let config = RunConfig::new(Some("robot"), Some("token"), Some("ghcr.io/acme/app:1.0"))?;
//! let driver = LifecycleDriver::new(DockerRuntime::connect().await?);
//!
//! let report = driver
//!     .run(&config, &mut std::io::stdout(), &mut std::io::stderr())
//!     .await?;
//! println!("exited with {}", report.exit.status_code);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod driver;
pub mod output;
pub mod runtime;

pub use config::RunConfig;
pub use driver::{LifecycleDriver, RunReport, Step};
pub use runtime::{ContainerRuntime, DockerRuntime};
