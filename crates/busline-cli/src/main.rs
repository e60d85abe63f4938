//! `busline` binary.

use std::process::ExitCode;

use busline_cli::{Args, run_traced};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = match args.simulation_config() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "invalid configuration");
            return ExitCode::FAILURE;
        },
    };

    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(
        seed,
        devices = config.device_count,
        attempts = config.attempts_per_device,
        hold_min_ms = config.hold_min.as_millis() as u64,
        hold_max_ms = config.hold_max.as_millis() as u64,
        jitter_max_ms = config.jitter_max.as_millis() as u64,
        "busline starting"
    );

    match run_traced(config, seed).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "simulation failed");
            ExitCode::FAILURE
        },
    }
}

/// `RUST_LOG` wins over `--log-level`; an unparsable filter falls back to
/// `info`.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
