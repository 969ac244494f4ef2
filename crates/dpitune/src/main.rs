//! dpitune - empirical DPI bypass strategy selection
//!
//! Trials each candidate strategy by launching the proxy under systemd,
//! probing the domain list through it, then ranks the results and installs
//! the strategy the operator picks.

use anyhow::{Context, Result};
use clap::Parser;
use dpitune::select;
use dpitune::service::ServiceController;
use dpitune::trial::{self, TrialConfig};
use dpitune_common::errors::{TuneError, EXIT_GENERAL_ERROR, EXIT_SUCCESS};
use dpitune_common::input;
use dpitune_common::ranking;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dpitune")]
#[command(about = "Trial DPI bypass strategies against a domain list and install the best one", long_about = None)]
#[command(version)]
struct Cli {
    /// File with candidate strategy argument strings, one per line
    #[arg(long, value_name = "FILE")]
    strategies: PathBuf,

    /// File with target domains, one per line
    #[arg(long, value_name = "FILE")]
    domains: PathBuf,

    /// Proxy listening port; prompted for when omitted, unusable values
    /// fall back to 8080
    #[arg(long)]
    port: Option<String>,

    /// Maximum probes in flight per trial
    #[arg(long, default_value_t = 8)]
    concurrency: usize,

    /// Proxy binary the service unit launches
    #[arg(long, default_value = "ciadpi")]
    proxy_bin: String,

    /// systemd unit name (without .service)
    #[arg(long, default_value = "dpitune-proxy")]
    unit: String,

    /// Write the ranked report as JSON
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Install the top-ranked strategy without prompting
    #[arg(long)]
    yes: bool,

    /// Rank and report only; skip unit installation
    #[arg(long)]
    no_install: bool,
}

async fn run(cli: Cli) -> Result<()> {
    let raw = std::fs::read_to_string(&cli.strategies)
        .with_context(|| format!("Failed to read {}", cli.strategies.display()))?;
    let settings = input::parse_list(&raw);
    if settings.is_empty() {
        return Err(TuneError::NoCandidates.into());
    }

    let raw = std::fs::read_to_string(&cli.domains)
        .with_context(|| format!("Failed to read {}", cli.domains.display()))?;
    let domains = input::parse_list(&raw);
    if domains.is_empty() {
        return Err(TuneError::NoDomains.into());
    }

    let port = match &cli.port {
        Some(value) => input::parse_port(value),
        None if select::stdin_is_tty() => select::prompt_port()?,
        None => input::DEFAULT_PORT,
    };

    info!(
        "Trialing {} strategies against {} domains through 127.0.0.1:{}",
        settings.len(),
        domains.len(),
        port
    );

    let controller = Arc::new(Mutex::new(ServiceController::new(&cli.unit, &cli.proxy_bin)));
    let config = TrialConfig {
        proxy_port: port,
        concurrency_limit: cli.concurrency,
    };

    // An interrupt in any phase must leave no proxy unit running behind.
    let trials = tokio::select! {
        trials = trial::run_trials(Arc::clone(&controller), &settings, &domains, config) => trials?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted; stopping proxy service");
            controller.lock().await.stop().await;
            anyhow::bail!("interrupted by operator");
        }
    };

    let ranked = ranking::rank(trials).map_err(anyhow::Error::new)?;
    select::render_ranked(&ranked);

    if let Some(path) = &cli.json {
        let report = serde_json::to_string_pretty(&ranked)?;
        std::fs::write(path, report)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote ranked report to {}", path.display());
    }

    let auto = cli.yes || !select::stdin_is_tty();
    let index = select::prompt_selection(&ranked, auto)?;
    let chosen = ranked[index].trial.clone();
    info!(
        "Selected '{}' ({}% of domains reachable)",
        chosen.setting, chosen.success_rate
    );

    if cli.no_install {
        // hand the choice to whatever wraps us
        println!("{}", chosen.setting);
        return Ok(());
    }

    controller.lock().await.install(&chosen.setting, port).await?;
    println!("Installed '{}' on port {}", chosen.setting, port);
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            err.downcast_ref::<TuneError>()
                .map(TuneError::exit_code)
                .unwrap_or(EXIT_GENERAL_ERROR)
        }
    };
    std::process::exit(code);
}
