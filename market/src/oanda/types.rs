use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::errors::ProviderError;
use crate::types::{PriceBar, PriceSeries};

/// Body of `GET /v3/instruments/{instrument}/candles`.
#[derive(Debug, Deserialize)]
pub struct CandlesEnvelope {
    #[serde(default)]
    pub instrument: Option<String>,
    #[serde(default)]
    pub granularity: Option<String>,
    pub candles: Vec<Candle>,
}

#[derive(Debug, Deserialize)]
pub struct Candle {
    pub time: String,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub volume: u64,
    pub mid: Option<CandleMid>,
}

/// Midpoint prices. OANDA encodes decimals as strings.
#[derive(Debug, Deserialize)]
pub struct CandleMid {
    pub o: String,
    pub h: String,
    pub l: String,
    pub c: String,
}

impl Candle {
    pub fn to_bar(&self) -> Result<PriceBar, ProviderError> {
        let mid = self
            .mid
            .as_ref()
            .ok_or_else(|| ProviderError::MissingMid(self.time.clone()))?;

        Ok(PriceBar {
            time: DateTime::parse_from_rfc3339(&self.time)?.with_timezone(&Utc),
            open: mid.o.parse()?,
            high: mid.h.parse()?,
            low: mid.l.parse()?,
            close: mid.c.parse()?,
        })
    }
}

impl CandlesEnvelope {
    /// Converts the payload into a validated series. Any bad candle fails
    /// the whole conversion.
    pub fn into_series(self) -> Result<PriceSeries, ProviderError> {
        let bars = self
            .candles
            .iter()
            .map(Candle::to_bar)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PriceSeries::new(bars)?)
    }
}
