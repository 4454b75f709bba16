use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use market::{
    CachedProvider, Instrument, MarketDataProvider, PriceBar, PriceSeries, ProviderError,
    Timeframe,
};

/// Counts upstream calls; fails for any instrument named `BAD_PAIR`.
#[derive(Default)]
struct CountingProvider {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl MarketDataProvider for CountingProvider {
    async fn fetch_series(
        &self,
        instrument: &Instrument,
        _timeframe: Timeframe,
        bar_count: usize,
    ) -> Result<PriceSeries, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if instrument.as_str() == "BAD_PAIR" {
            return Err(ProviderError::UnknownInstrument(instrument.to_string()));
        }

        let bars = (0..bar_count)
            .map(|i| PriceBar {
                time: Utc.timestamp_opt(1_700_000_000 + i as i64 * 3_600, 0).unwrap(),
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
            })
            .collect();
        Ok(PriceSeries::new(bars)?)
    }
}

#[tokio::test]
async fn repeated_fetches_hit_the_cache() -> anyhow::Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = CachedProvider::new(
        CountingProvider {
            calls: calls.clone(),
        },
        Duration::from_secs(600),
    );
    let eur = Instrument::new("EUR_USD");

    let a = provider.fetch_series(&eur, Timeframe::H4, 50).await?;
    let b = provider.fetch_series(&eur, Timeframe::H4, 50).await?;

    assert_eq!(a, b);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.cache().len(), 1);

    Ok(())
}

#[tokio::test]
async fn invalidate_forces_a_fresh_fetch() -> anyhow::Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = CachedProvider::new(
        CountingProvider {
            calls: calls.clone(),
        },
        Duration::from_secs(600),
    );
    let eur = Instrument::new("EUR_USD");

    provider.fetch_series(&eur, Timeframe::Daily, 20).await?;
    provider.invalidate();
    provider.fetch_series(&eur, Timeframe::Daily, 20).await?;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn failures_are_not_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = CachedProvider::new(
        CountingProvider {
            calls: calls.clone(),
        },
        Duration::from_secs(600),
    );
    let bad = Instrument::new("BAD_PAIR");

    assert!(provider.fetch_series(&bad, Timeframe::H1, 10).await.is_err());
    assert!(provider.fetch_series(&bad, Timeframe::H1, 10).await.is_err());

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(provider.cache().is_empty());
}
