use std::fmt;
use std::str::FromStr;

use market::PriceBar;
use serde::{Deserialize, Serialize};

/// Which per-bar price feeds the oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// (open + high + low + close) / 4
    #[default]
    Ohlc4,
    Close,
}

impl PriceSource {
    pub fn of(&self, bar: &PriceBar) -> f64 {
        match self {
            PriceSource::Ohlc4 => bar.ohlc4(),
            PriceSource::Close => bar.close,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSource::Ohlc4 => "ohlc4",
            PriceSource::Close => "close",
        }
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ohlc4" => Ok(PriceSource::Ohlc4),
            "close" => Ok(PriceSource::Close),
            other => Err(format!("unknown price source: {other}")),
        }
    }
}
