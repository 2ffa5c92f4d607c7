//! fOS Font Watch - scenario replay entry point
//!
//! Usage: `fontwatch <scenario.json>`
//!
//! Prints a JSON report to stdout. Exits with 0 when the font went active and
//! 2 when it went inactive.

mod scenario;

use std::process::ExitCode;

use anyhow::Context;
use fos_fontwatch::WatchOutcome;
use tracing_subscriber::EnvFilter;

use scenario::{Scenario, replay};

fn main() -> anyhow::Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .context("Usage: fontwatch <scenario.json>")?;

    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read scenario {}", path))?;
    let scenario = Scenario::from_json(&json)
        .with_context(|| format!("Failed to load scenario {}", path))?;

    tracing::info!("Replaying {} ({})", path, scenario.font);
    let report = replay(&scenario)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(match report.outcome {
        WatchOutcome::Active => ExitCode::SUCCESS,
        WatchOutcome::Inactive => ExitCode::from(2),
    })
}
