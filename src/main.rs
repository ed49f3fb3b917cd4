//! Greeter service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net::Listener ──▶ http::server ──▶ observability middleware
//!                     (permits)         (hyper conn)     (request id, logger, timer)
//!                                                                 │
//!                                                                 ▼
//!     Client Response                                     handlers::greet
//!     ◀──────────────────────────────────────────────────  greeting::Greeter
//!
//!     Cross-cutting: config (TOML + CLI/env), logging (console + file),
//!     metrics (Prometheus histogram), lifecycle (signals, graceful drain)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use greeter_service::config::{resolve_config, ConfigOverrides};
use greeter_service::lifecycle::{startup, DrainOutcome, RunOutcome, FORCED_EXIT_CODE};
use greeter_service::observability::init_logging;

#[derive(Parser)]
#[command(name = "greeter-service")]
#[command(about = "HTTP greeting service with request metrics and graceful shutdown", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "GREETER_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:8080.
    #[arg(short, long, env = "GREETER_BIND")]
    bind: Option<String>,

    /// Append-only log file.
    #[arg(long, env = "GREETER_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let overrides = ConfigOverrides {
        bind_address: cli.bind,
        log_file: cli.log_file,
    };

    let config = match resolve_config(cli.config.as_deref(), overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("greeter-service: failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Flushes the file writer when dropped at the end of main, on every exit path.
    let _log_guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("greeter-service: failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        log_file = %config.logging.file_path.display(),
        "greeter-service starting"
    );

    match startup::run(config).await {
        Ok(RunOutcome::Drained(DrainOutcome::Graceful)) => {
            tracing::info!("server stopped gracefully");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Drained(DrainOutcome::Forced { aborted })) => {
            tracing::warn!(aborted, "server stopped after closing unfinished connections");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::ForcedExit) => ExitCode::from(FORCED_EXIT_CODE),
        Err(e) => {
            tracing::error!(fatal = true, error = %e, "startup failed");
            ExitCode::FAILURE
        }
    }
}
