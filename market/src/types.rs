use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::SeriesError;

/// Tradable symbol in provider notation, e.g. `EUR_USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instrument(String);

impl Instrument {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human form used in tables: `EUR_USD` -> `EUR/USD`.
    pub fn display_name(&self) -> String {
        self.0.replace('_', "/")
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Instrument {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Bar granularity scanned by the screener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    H1,
    H4,
    Daily,
    Weekly,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid timeframe: {0}")]
pub struct ParseTimeframeError(pub String);

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::Daily,
        Timeframe::Weekly,
    ];

    /// Column label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::Daily => "Daily",
            Timeframe::Weekly => "Weekly",
        }
    }

    /// Granularity code understood by the OANDA candles endpoint.
    pub fn granularity(&self) -> &'static str {
        match self {
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::Daily => "D",
            Timeframe::Weekly => "W",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = ParseTimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "H1" => Ok(Timeframe::H1),
            "H4" => Ok(Timeframe::H4),
            "D" | "D1" | "DAILY" => Ok(Timeframe::Daily),
            "W" | "W1" | "WEEKLY" => Ok(Timeframe::Weekly),
            _ => Err(ParseTimeframeError(s.to_string())),
        }
    }
}

/// One OHLC candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    /// Average of open, high, low and close.
    pub fn ohlc4(&self) -> f64 {
        (self.open + self.high + self.low + self.close) / 4.0
    }
}

/// Chronological, validated window of bars for one (instrument, timeframe).
///
/// Immutable once built; a refresh builds a new series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Validates ordering and prices.
    ///
    /// Rejects empty input, timestamps that are not strictly increasing and
    /// prices that are negative or non-finite.
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        if bars.is_empty() {
            return Err(SeriesError::Empty);
        }

        for (index, bar) in bars.iter().enumerate() {
            for value in [bar.open, bar.high, bar.low, bar.close] {
                if !value.is_finite() || value < 0.0 {
                    return Err(SeriesError::InvalidPrice { index, value });
                }
            }
        }

        if let Some(index) = bars
            .windows(2)
            .position(|w| w[1].time <= w[0].time)
            .map(|i| i + 1)
        {
            return Err(SeriesError::NotIncreasing { index });
        }

        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// The trailing `n` bars (or all of them when shorter).
    pub fn tail(&self, n: usize) -> &[PriceBar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}
