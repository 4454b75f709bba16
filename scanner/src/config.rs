use std::str::FromStr;
use std::time::Duration;

use market::{Instrument, Timeframe};
use signals::{DivergenceParams, PriceSource, RsiParams, Smoothing, Thresholds};

use crate::error::ConfigError;

/// FX majors and crosses plus gold, in display order.
pub const DEFAULT_INSTRUMENTS: &[&str] = &[
    "EUR_USD", "GBP_USD", "USD_JPY", "USD_CHF", "AUD_USD", "USD_CAD", "NZD_USD", "EUR_GBP",
    "EUR_JPY", "EUR_CHF", "EUR_AUD", "EUR_CAD", "EUR_NZD", "GBP_JPY", "GBP_CHF", "GBP_AUD",
    "GBP_CAD", "GBP_NZD", "AUD_JPY", "AUD_CAD", "AUD_CHF", "AUD_NZD", "CAD_JPY", "CAD_CHF",
    "CHF_JPY", "NZD_JPY", "NZD_CAD", "NZD_CHF", "XAU_USD",
];

pub const PRACTICE_URL: &str = market::oanda::client::PRACTICE_URL;
pub const LIVE_URL: &str = market::oanda::client::LIVE_URL;

#[derive(Clone, Debug)]
pub struct ScreenerConfig {
    // =========================
    // Data provider
    // =========================
    /// REST base URL of the candles API.
    pub oanda_base_url: String,

    /// Bearer token. Required for live scans, irrelevant for tests that
    /// inject their own provider.
    pub oanda_api_key: Option<String>,

    /// Per-request HTTP timeout.
    pub fetch_timeout: Duration,

    /// Bars requested per (instrument, timeframe).
    ///
    /// Must cover the divergence lookback; the oscillator warm-up is
    /// checked per series at compute time.
    pub bar_count: usize,

    // =========================
    // Universe
    // =========================
    /// Row order of the result matrix.
    pub instruments: Vec<Instrument>,

    /// Column order of the result matrix.
    pub timeframes: Vec<Timeframe>,

    // =========================
    // Signal parameters
    // =========================
    pub rsi: RsiParams,
    pub divergence: DivergenceParams,

    /// Oversold / overbought pair used by every presentation surface.
    pub thresholds: Thresholds,

    // =========================
    // Execution
    // =========================
    /// Maximum number of (instrument, timeframe) units in flight.
    ///
    /// Purpose:
    /// - bound concurrent requests against the provider
    /// - keep rate-limit pressure predictable
    pub workers: usize,

    /// Lifetime of cached series. Zero disables the cache.
    pub cache_ttl: Duration,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            oanda_base_url: PRACTICE_URL.to_string(),
            oanda_api_key: None,
            fetch_timeout: Duration::from_secs(10),
            bar_count: 100,
            instruments: DEFAULT_INSTRUMENTS.iter().map(|s| Instrument::new(*s)).collect(),
            timeframes: Timeframe::ALL.to_vec(),
            rsi: RsiParams::default(),
            divergence: DivergenceParams::default(),
            thresholds: Thresholds::default(),
            workers: 8,
            cache_ttl: Duration::from_secs(600),
        }
    }
}

impl ScreenerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to
    /// defaults for absent keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        let env = get("OANDA_ENV").unwrap_or_else(|| "practice".to_string());
        cfg.oanda_base_url = match env.trim().to_lowercase().as_str() {
            "practice" | "demo" => PRACTICE_URL.to_string(),
            "live" | "trade" => LIVE_URL.to_string(),
            other => {
                return Err(ConfigError::InvalidValue {
                    key: "OANDA_ENV",
                    value: other.to_string(),
                    reason: "expected practice or live".into(),
                });
            }
        };
        if let Some(url) = get("OANDA_BASE_URL") {
            cfg.oanda_base_url = url;
        }
        cfg.oanda_api_key = get("OANDA_API_KEY");

        if let Some(v) = get("SCREENER_RSI_PERIOD") {
            cfg.rsi.period = parse("SCREENER_RSI_PERIOD", &v)?;
        }
        if let Some(v) = get("SCREENER_PRICE_SOURCE") {
            cfg.rsi.source = parse::<PriceSource>("SCREENER_PRICE_SOURCE", &v)?;
        }
        if let Some(v) = get("SCREENER_SMOOTHING") {
            cfg.rsi.smoothing = parse::<Smoothing>("SCREENER_SMOOTHING", &v)?;
        }

        let oversold = match get("SCREENER_OVERSOLD") {
            Some(v) => parse("SCREENER_OVERSOLD", &v)?,
            None => cfg.thresholds.oversold(),
        };
        let overbought = match get("SCREENER_OVERBOUGHT") {
            Some(v) => parse("SCREENER_OVERBOUGHT", &v)?,
            None => cfg.thresholds.overbought(),
        };
        cfg.thresholds = Thresholds::new(oversold, overbought)?;

        if let Some(v) = get("SCREENER_LOOKBACK") {
            cfg.divergence.lookback = parse("SCREENER_LOOKBACK", &v)?;
        }
        if let Some(v) = get("SCREENER_PEAK_DISTANCE") {
            cfg.divergence.peak_distance = parse("SCREENER_PEAK_DISTANCE", &v)?;
        }
        if let Some(v) = get("SCREENER_BAR_COUNT") {
            cfg.bar_count = parse("SCREENER_BAR_COUNT", &v)?;
        }
        if let Some(v) = get("SCREENER_WORKERS") {
            cfg.workers = parse("SCREENER_WORKERS", &v)?;
        }
        if let Some(v) = get("SCREENER_CACHE_TTL_SECS") {
            cfg.cache_ttl = Duration::from_secs(parse("SCREENER_CACHE_TTL_SECS", &v)?);
        }
        if let Some(v) = get("SCREENER_FETCH_TIMEOUT_SECS") {
            cfg.fetch_timeout = Duration::from_secs(parse("SCREENER_FETCH_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("SCREENER_INSTRUMENTS") {
            cfg.instruments = parse_instruments(&v);
        }
        if let Some(v) = get("SCREENER_TIMEFRAMES") {
            cfg.timeframes = parse_timeframes(&v)?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rsi.period == 0 {
            return Err(ConfigError::Zero("rsi period"));
        }
        if self.workers == 0 {
            return Err(ConfigError::Zero("worker count"));
        }
        if self.bar_count == 0 {
            return Err(ConfigError::Zero("bar count"));
        }
        if self.divergence.peak_distance == 0 {
            return Err(ConfigError::Zero("peak distance"));
        }
        if self.divergence.lookback < 3 {
            return Err(ConfigError::LookbackTooShort(self.divergence.lookback));
        }
        if self.bar_count < self.divergence.lookback {
            return Err(ConfigError::BarCountTooSmall {
                bar_count: self.bar_count,
                lookback: self.divergence.lookback,
            });
        }
        if self.instruments.is_empty() {
            return Err(ConfigError::NoInstruments);
        }
        if self.timeframes.is_empty() {
            return Err(ConfigError::NoTimeframes);
        }
        Ok(())
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Comma-separated symbols; blanks and duplicates are dropped, order kept.
pub fn parse_instruments(list: &str) -> Vec<Instrument> {
    let mut out: Vec<Instrument> = Vec::new();
    for sym in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let inst = Instrument::new(sym);
        if !out.contains(&inst) {
            out.push(inst);
        }
    }
    out
}

/// Comma-separated timeframes; duplicates are dropped, order kept.
pub fn parse_timeframes(list: &str) -> Result<Vec<Timeframe>, ConfigError> {
    let mut out = Vec::new();
    for raw in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let tf: Timeframe = parse("SCREENER_TIMEFRAMES", raw)?;
        if !out.contains(&tf) {
            out.push(tf);
        }
    }
    Ok(out)
}
