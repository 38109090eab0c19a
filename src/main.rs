//! Grants Radar — binary entrypoint.
//! Runs one scan cycle over the configured sources, posts the digest, and
//! writes the run-summary artifact next to the working directory.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use grants_radar::extract::client::XaiClient;
use grants_radar::notify::slack::SlackNotifier;
use grants_radar::scan::config::ScanConfig;
use grants_radar::scan::fetch::TokioSleeper;
use grants_radar::Scanner;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("grants_radar=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    // Missing credentials or config surface here, before any scanning.
    let config = ScanConfig::load_default()?;
    let model = Arc::new(XaiClient::from_env()?);
    let notifier = Arc::new(SlackNotifier::from_env()?);

    let scanner = Scanner::new(config, model, notifier, Arc::new(TokioSleeper));
    let summary = scanner.run().await;

    let path = format!(
        "grants_scan_{}.json",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let json = serde_json::to_string_pretty(&summary).context("serializing scan summary")?;
    std::fs::write(&path, &json).with_context(|| format!("writing {path}"))?;
    tracing::info!(summary_file = %path, "results saved");

    Ok(())
}
