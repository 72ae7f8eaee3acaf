//! Job worker binary.
//!
//! Reads newline-delimited job JSON from the file given as first argument (or
//! stdin) and prints one result JSON per line to stdout. Logs go to stderr.

use anyhow::Context;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reelhook_worker::{run_jobs, CallbackHandler, CommandAdapter, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("reelhook=info".parse().unwrap())
        .add_directive("aws_config=warn".parse().unwrap())
        .add_directive("aws_smithy_runtime=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting reelhook-worker");

    let config = WorkerConfig::from_env();
    info!(
        handler = ?config.handler_cmd,
        job_timeout_secs = config.job_timeout.as_secs(),
        transcode = config.transcode.enabled,
        fallback_url = config.delivery.fallback_url.is_some(),
        "Worker config loaded"
    );

    let cmd = config
        .handler_cmd
        .as_deref()
        .context("JOB_HANDLER_CMD is not set")?;
    let adapter = CommandAdapter::from_command_line(cmd)?.with_timeout(config.job_timeout);
    let dispatcher = config.build_dispatcher()?;
    let handler = CallbackHandler::new(adapter, dispatcher);

    let stdout = tokio::io::stdout();
    let processed = match std::env::args().nth(1) {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("Failed to open job file {}", path))?;
            run_jobs(&handler, BufReader::new(file), stdout).await?
        }
        None => run_jobs(&handler, BufReader::new(tokio::io::stdin()), stdout).await?,
    };

    info!(processed, "Worker shutdown complete");
    Ok(())
}
