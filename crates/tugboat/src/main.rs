//! Tugboat CLI entry point.

use color_eyre::eyre::Result;
use miette::Diagnostic;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tugboat::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // Diagnostics go to stderr; stdout carries pull progress and container output.
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("tugboat=warn".parse()?))
        .init();

    let cli = match Cli::parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => {
            let code = i32::from(err.use_stderr());
            let _ = err.print();
            std::process::exit(code);
        }
    };

    match cli.execute().await {
        Ok(report) => {
            tracing::debug!(
                container = %report.container,
                status_code = report.exit.status_code,
                stdout_bytes = report.stdout_bytes,
                stderr_bytes = report.stderr_bytes,
                "Finished"
            );
            Ok(())
        }
        Err(err) => {
            tracing::debug!(error = %err, "Run failed");
            println!("{err}");
            if let Some(help) = err.help() {
                eprintln!("help: {help}");
            }
            std::process::exit(1);
        }
    }
}
