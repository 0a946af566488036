// `main.rs` only wires things up: logging, configuration, then
// `server::run()`. Configuration is validated before anything binds, so a
// missing variable ends the process with a non-zero exit and no listener.
mod config;
mod handlers;
mod hub;
mod metrics;
mod renewer;
mod server;
mod telemetry;

use config::Config;
use std::process::ExitCode;

// Fatal errors are reported once, through tracing, and mapped to a failing
// exit code instead of being returned to the runtime's default printer.
#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match server::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "fatal");
            ExitCode::FAILURE
        }
    }
}
