use anyhow::Context;
use gridlock_sim::adapters::outbound::{init_combined_logger, init_console_logger, StdoutSink};
use gridlock_sim::application::Simulation;
use gridlock_sim::Config;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Stdout carries the trace stream; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));
    let config = Config::load(Some(path.as_path()))
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    info!(config = %path.display(), "configuration loaded");

    let logger = match &config.output.log_file {
        Some(file) => init_combined_logger(file),
        None => init_console_logger(),
    };

    let simulation = Simulation::new(config, logger);
    let report = simulation.run(StdoutSink::stdout()).await?;
    info!(
        run = %report.run_id,
        seed = report.seed,
        traces = report.traces,
        batches = report.batches,
        "simulation finished"
    );

    Ok(())
}
