use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

use crate::errors::ProviderError;
use crate::oanda::types::CandlesEnvelope;
use crate::provider::MarketDataProvider;
use crate::types::{Instrument, PriceSeries, Timeframe};

pub const PRACTICE_URL: &str = "https://api-fxpractice.oanda.com";
pub const LIVE_URL: &str = "https://api-fxtrade.oanda.com";

/// OANDA v20 REST client for midpoint candles.
#[derive(Clone)]
pub struct OandaClient {
    http: Client,
    url: String,
    api_key: String,
}

impl OandaClient {
    pub fn new(url: String, api_key: String, timeout: Duration) -> Result<Self, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::MissingCredentials);
        }

        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn candles_url(&self, instrument: &Instrument) -> String {
        format!("{}/v3/instruments/{}/candles", self.url, instrument)
    }

    #[instrument(
        skip(self),
        fields(instrument = %instrument, granularity = timeframe.granularity()),
        level = "debug"
    )]
    pub async fn fetch_candles(
        &self,
        instrument: &Instrument,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<CandlesEnvelope, ProviderError> {
        let resp = self
            .http
            .get(self.candles_url(instrument))
            .bearer_auth(&self.api_key)
            .query(&[
                ("granularity", timeframe.granularity().to_string()),
                ("count", count.to_string()),
                ("price", "M".to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ProviderError::Unauthorized);
            }
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                return Err(ProviderError::UnknownInstrument(instrument.to_string()));
            }
            s if !s.is_success() => {
                let body = resp.text().await.unwrap_or_default();
                return Err(ProviderError::Status {
                    status: s.as_u16(),
                    body,
                });
            }
            _ => {}
        }

        let envelope: CandlesEnvelope = resp.json().await?;

        debug!(candles = envelope.candles.len(), "oanda candles fetched");

        Ok(envelope)
    }
}

#[async_trait]
impl MarketDataProvider for OandaClient {
    async fn fetch_series(
        &self,
        instrument: &Instrument,
        timeframe: Timeframe,
        bar_count: usize,
    ) -> Result<PriceSeries, ProviderError> {
        self.fetch_candles(instrument, timeframe, bar_count)
            .await?
            .into_series()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_rejected() {
        let res = OandaClient::new(PRACTICE_URL.into(), "  ".into(), Duration::from_secs(5));
        assert!(matches!(res, Err(ProviderError::MissingCredentials)));
    }

    #[test]
    fn candles_url_uses_instrument_path() {
        let client = OandaClient::new(
            format!("{PRACTICE_URL}/"),
            "token".into(),
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(
            client.candles_url(&Instrument::new("EUR_USD")),
            "https://api-fxpractice.oanda.com/v3/instruments/EUR_USD/candles"
        );
    }
}
