use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::types::{Instrument, PriceSeries, Timeframe};

/// Source of OHLC history.
///
/// Implementations must return bars in ascending chronological order and
/// fail the whole request (network, auth, unknown instrument, malformed
/// payload) instead of returning partial data.
#[async_trait]
pub trait MarketDataProvider: Send + Sync + 'static {
    async fn fetch_series(
        &self,
        instrument: &Instrument,
        timeframe: Timeframe,
        bar_count: usize,
    ) -> Result<PriceSeries, ProviderError>;

    /// Drops any locally held data so the next fetch goes upstream.
    fn invalidate(&self) {}
}
