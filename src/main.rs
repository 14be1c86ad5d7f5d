//! # Oxide-E2E runner
//!
//! Runs the built-in suites against `base.url`.
//!
//! Settings are layered, later wins:
//! 1. the properties/TOML file (`--config`, else `./e2e.properties` if present)
//! 2. `E2E_*` environment variables (`E2E_BASE_URL` -> `base.url`)
//! 3. command-line flags

use anyhow::Context;
use clap::Parser;
use oxide_e2e::{
    config::{HarnessConfig, Settings},
    driver::ChromeDriverFactory,
    report::ConsoleListener,
    runner::{self, Harness},
    suites,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "e2e.properties";

#[derive(Parser)]
#[command(name = "oxide-e2e")]
#[command(about = "Browser-driven end-to-end tests for the marketing site and invitation flow")]
#[command(version)]
struct Cli {
    /// Properties or TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Browser to drive (chrome, chromium, edge)
    #[arg(short, long)]
    browser: Option<String>,

    /// Run without a visible window
    #[arg(long)]
    headless: bool,

    /// Application origin, e.g. http://localhost:3000
    #[arg(long)]
    base_url: Option<String>,

    /// Only run tests whose name contains this
    #[arg(short, long)]
    filter: Option<String>,

    /// List test names and exit
    #[arg(long)]
    list: bool,

    /// Write the run summary as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let file = match &cli.config {
        Some(path) => Some(path.clone()),
        None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
    };

    let mut settings = match &file {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("reading settings from {}", path.display()))?,
        None => Settings::new(),
    }
    .with_env_overrides();

    if let Some(browser) = &cli.browser {
        settings.set("browser", browser.as_str());
    }
    if cli.headless {
        settings.set("headless", "true");
    }
    if let Some(base_url) = &cli.base_url {
        settings.set("base.url", base_url.as_str());
    }

    Ok(settings)
}

fn write_report(path: &Path, summary: &oxide_e2e::RunSummary) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json).with_context(|| format!("writing report to {}", path.display()))?;
    info!("Report written to {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let tests = runner::select(suites::all(), cli.filter.as_deref());
    if cli.list {
        for test in &tests {
            println!("{}", test.name());
        }
        return Ok(());
    }

    info!("Oxide-E2E v{}", oxide_e2e::VERSION);

    let settings = load_settings(&cli)?;
    let config = HarnessConfig::from_settings(&settings)?;
    info!(
        "Configuration loaded: browser={}, headless={}, base_url={}",
        config.browser, config.headless, config.base_url
    );

    if tests.is_empty() {
        warn!("No tests match the filter");
    }

    let harness = Harness::new(config, Arc::new(ChromeDriverFactory::new()));
    let mut console = ConsoleListener::new();

    let summary = tokio::select! {
        summary = harness.run_all(&tests, &mut console) => summary,
        _ = tokio::signal::ctrl_c() => {
            error!("Interrupted, abandoning the run");
            let released = harness.shutdown().await;
            info!("Released {} open session(s)", released);
            anyhow::bail!("interrupted");
        }
    };

    println!("{}", summary);
    if let Some(path) = &cli.report {
        write_report(path, &summary)?;
    }

    if !summary.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
