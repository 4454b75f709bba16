pub mod cli;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::time::MissedTickBehavior;

use cli::Cli;
use common::logger::{init_logger, is_production};
use market::oanda::OandaClient;
use market::{CachedProvider, MarketDataProvider};
use scanner::report::{self, MarkdownReport};
use scanner::{AppState, ScanOutcome, ScreenerConfig, Screener};

/// Prints the outcome and writes the requested export files.
fn emit(outcome: &ScanOutcome, cfg: &ScreenerConfig, cli: &Cli) -> anyhow::Result<()> {
    println!("{}", report::render_terminal(outcome, &cfg.thresholds));

    if let Some(path) = &cli.json {
        let json = report::to_json(outcome, &cfg.thresholds).context("serializing scan")?;
        write_file(path, &json)?;
    }
    if let Some(path) = &cli.report {
        let md = MarkdownReport {
            outcome,
            config: cfg,
        }
        .to_string();
        write_file(path, &md)?;
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = contents.len(), "export written");
    Ok(())
}

/// One scan, or a scan per tick in watch mode until Ctrl-C.
async fn run<P: MarketDataProvider>(
    provider: Arc<P>,
    cfg: &ScreenerConfig,
    cli: &Cli,
) -> anyhow::Result<()> {
    let screener = Screener::new(provider, cfg, AppState::new());

    let Some(secs) = cli.watch else {
        let outcome = screener.scan().await;
        return emit(&outcome, cfg, cli);
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = screener.scan().await;
                if let Err(e) = emit(&outcome, cfg, cli) {
                    tracing::error!(error = ?e, "failed to publish scan");
                }
            }
            res = tokio::signal::ctrl_c() => {
                res?;
                tracing::info!("Shutdown signal received");
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger("rsi-screener", is_production());

    let cli = Cli::parse();

    let mut cfg = ScreenerConfig::from_env().context("reading screener configuration")?;
    cli.apply(&mut cfg)?;

    tracing::info!(
        instruments = cfg.instruments.len(),
        timeframes = cfg.timeframes.len(),
        period = cfg.rsi.period,
        workers = cfg.workers,
        cache_ttl_secs = cfg.cache_ttl.as_secs(),
        "Starting RSI screener..."
    );

    let client = OandaClient::new(
        cfg.oanda_base_url.clone(),
        cfg.oanda_api_key.clone().unwrap_or_default(),
        cfg.fetch_timeout,
    )
    .context("building OANDA client (is OANDA_API_KEY set?)")?;

    if cfg.cache_ttl.is_zero() {
        run(Arc::new(client), &cfg, &cli).await
    } else {
        let cached = CachedProvider::new(client, cfg.cache_ttl);
        run(Arc::new(cached), &cfg, &cli).await
    }
}
