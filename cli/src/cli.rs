use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use market::Timeframe;
use scanner::ScreenerConfig;
use scanner::config::parse_instruments;
use signals::{PriceSource, Smoothing, Thresholds};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PriceSourceCli {
    Ohlc4,
    Close,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SmoothingCli {
    Wilder,
    Simple,
}

/// Every flag overrides the matching environment setting.
#[derive(Debug, Parser)]
#[clap(name = "rsi-screener", version, about = "RSI and divergence screener")]
pub struct Cli {
    /// Instruments to scan (comma-separated, e.g. EUR_USD,XAU_USD)
    #[clap(long, value_delimiter = ',')]
    pub instruments: Vec<String>,

    /// Timeframes to scan (comma-separated: H1,H4,D,W)
    #[clap(long, value_delimiter = ',')]
    pub timeframes: Vec<Timeframe>,

    /// RSI period
    #[clap(long)]
    pub period: Option<usize>,

    /// Oversold threshold (inclusive)
    #[clap(long)]
    pub oversold: Option<f64>,

    /// Overbought threshold (inclusive)
    #[clap(long)]
    pub overbought: Option<f64>,

    /// Price fed into the oscillator
    #[clap(long, value_enum)]
    pub price_source: Option<PriceSourceCli>,

    /// Gain/loss smoothing
    #[clap(long, value_enum)]
    pub smoothing: Option<SmoothingCli>,

    /// Divergence lookback in bars
    #[clap(long)]
    pub lookback: Option<usize>,

    /// Maximum concurrent fetches
    #[clap(long)]
    pub workers: Option<usize>,

    /// Rescan every N seconds until Ctrl-C
    #[clap(long, value_name = "SECS")]
    pub watch: Option<u64>,

    /// Write the scan as JSON
    #[clap(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Write a markdown report with the ranked opportunities
    #[clap(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Bypass the series cache
    #[clap(long)]
    pub no_cache: bool,
}

pub(crate) fn cli_to_price_source(p: PriceSourceCli) -> PriceSource {
    match p {
        PriceSourceCli::Ohlc4 => PriceSource::Ohlc4,
        PriceSourceCli::Close => PriceSource::Close,
    }
}

pub(crate) fn cli_to_smoothing(s: SmoothingCli) -> Smoothing {
    match s {
        SmoothingCli::Wilder => Smoothing::Wilder,
        SmoothingCli::Simple => Smoothing::Simple,
    }
}

impl Cli {
    /// Layers the flags over `cfg` and re-validates the result.
    pub fn apply(&self, cfg: &mut ScreenerConfig) -> anyhow::Result<()> {
        if !self.instruments.is_empty() {
            cfg.instruments = parse_instruments(&self.instruments.join(","));
        }
        if !self.timeframes.is_empty() {
            let mut tfs = Vec::new();
            for tf in &self.timeframes {
                if !tfs.contains(tf) {
                    tfs.push(*tf);
                }
            }
            cfg.timeframes = tfs;
        }
        if let Some(period) = self.period {
            cfg.rsi.period = period;
        }
        if let Some(source) = self.price_source {
            cfg.rsi.source = cli_to_price_source(source);
        }
        if let Some(smoothing) = self.smoothing {
            cfg.rsi.smoothing = cli_to_smoothing(smoothing);
        }
        if self.oversold.is_some() || self.overbought.is_some() {
            cfg.thresholds = Thresholds::new(
                self.oversold.unwrap_or(cfg.thresholds.oversold()),
                self.overbought.unwrap_or(cfg.thresholds.overbought()),
            )?;
        }
        if let Some(lookback) = self.lookback {
            cfg.divergence.lookback = lookback;
        }
        if let Some(workers) = self.workers {
            cfg.workers = workers;
        }
        if self.no_cache {
            cfg.cache_ttl = std::time::Duration::ZERO;
        }

        cfg.validate()?;
        Ok(())
    }
}
