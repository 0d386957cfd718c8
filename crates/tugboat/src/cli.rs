//! Command-line interface.

use std::ffi::OsString;
use std::io;

use clap::Parser;
use tugboat_common::TugboatResult;

use crate::config::RunConfig;
use crate::driver::{LifecycleDriver, RunReport};
use crate::runtime::DockerRuntime;

/// Long options that take a value.
const VALUE_OPTIONS: &[&str] = &["username", "token", "image"];

/// Long options that may also be spelled with a single dash (`-image`).
const SINGLE_DASH_LONGS: &[&str] = &["username", "token", "image", "help", "version"];

/// Pull a registry image, run it once on port 8080 and stream its logs
#[derive(Parser, Debug)]
#[command(name = "tugboat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Registry username
    #[arg(long, allow_hyphen_values = true)]
    pub username: Option<String>,

    /// Registry auth token
    #[arg(long, allow_hyphen_values = true)]
    pub token: Option<String>,

    /// Registry image
    #[arg(long, allow_hyphen_values = true)]
    pub image: Option<String>,
}

impl Cli {
    /// Parse arguments, accepting single-dash long options.
    ///
    /// # Errors
    ///
    /// Returns the clap error for unknown options, missing values, and help
    /// or version requests.
    pub fn parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }

    /// Validate the parsed arguments into a run configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter is missing or the image is malformed.
    pub fn config(&self) -> TugboatResult<RunConfig> {
        RunConfig::new(
            self.username.as_deref(),
            self.token.as_deref(),
            self.image.as_deref(),
        )
    }

    /// Run the lifecycle against the local Docker daemon.
    ///
    /// Parameters are validated before any connection is attempted.
    ///
    /// # Errors
    ///
    /// Returns the first error of validation, connection, or any lifecycle
    /// step.
    pub async fn execute(self) -> TugboatResult<RunReport> {
        let config = self.config()?;
        let runtime = DockerRuntime::connect().await?;
        let driver = LifecycleDriver::new(runtime);

        driver
            .run(&config, &mut io::stdout(), &mut io::stderr())
            .await
    }
}

/// Rewrite `-name` and `-name=value` to `--name` forms for the known long
/// options. The argument after a value-taking option is its value and is
/// never rewritten, so tokens like `-AbC123` survive. Everything after a bare
/// `--` is left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut normalized: Vec<OsString> = args.next().into_iter().collect();
    let mut expects_value = false;

    while let Some(arg) = args.next() {
        if expects_value {
            expects_value = false;
            normalized.push(arg);
            continue;
        }
        if arg == "--" {
            normalized.push(arg);
            normalized.extend(args.by_ref());
            break;
        }

        let arg = arg.to_str().and_then(as_double_dash).unwrap_or(arg);
        expects_value = arg.to_str().is_some_and(awaits_value);
        normalized.push(arg);
    }

    normalized
}

/// `--name` for a value-taking option, with no inline `=value`.
fn awaits_value(arg: &str) -> bool {
    arg.strip_prefix("--")
        .is_some_and(|name| VALUE_OPTIONS.contains(&name))
}

fn as_double_dash(arg: &str) -> Option<OsString> {
    let rest = arg.strip_prefix('-').filter(|rest| !rest.starts_with('-'))?;
    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
    SINGLE_DASH_LONGS
        .contains(&name)
        .then(|| OsString::from(format!("-{arg}")))
}
