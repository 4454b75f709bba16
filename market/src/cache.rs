use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::errors::ProviderError;
use crate::provider::MarketDataProvider;
use crate::types::{Instrument, PriceSeries, Timeframe};

type Key = (Instrument, Timeframe);

struct Entry {
    series: PriceSeries,
    bar_count: usize,
    stored_at: Instant,
}

/// Short-lived read-through store of fetched series.
///
/// Guarantees:
/// - An entry older than `ttl` is never returned.
/// - Entries are keyed by (instrument, timeframe); a lookup with a different
///   bar count is a miss.
/// - Concurrent writers for the same key race to an idempotent insert, last
///   write wins.
pub struct SeriesCache {
    ttl: Duration,
    entries: Mutex<HashMap<Key, Entry>>,
}

impl SeriesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Returns a fresh copy of the cached series, evicting it if it expired.
    pub fn get(
        &self,
        instrument: &Instrument,
        timeframe: Timeframe,
        bar_count: usize,
    ) -> Option<PriceSeries> {
        let key = (instrument.clone(), timeframe);
        let mut entries = self.entries.lock();

        let entry = entries.get(&key)?;
        if entry.stored_at.elapsed() >= self.ttl {
            entries.remove(&key);
            debug!(%instrument, %timeframe, "cache entry expired");
            return None;
        }

        (entry.bar_count == bar_count).then(|| entry.series.clone())
    }

    pub fn insert(
        &self,
        instrument: &Instrument,
        timeframe: Timeframe,
        bar_count: usize,
        series: PriceSeries,
    ) {
        self.entries.lock().insert(
            (instrument.clone(), timeframe),
            Entry {
                series,
                bar_count,
                stored_at: Instant::now(),
            },
        );
    }

    #[instrument(skip(self), target = "cache")]
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();

        info!(count, "series cache cleared");
    }
}

/// Wraps a provider with a [`SeriesCache`]. Failures are never cached.
pub struct CachedProvider<P> {
    inner: P,
    cache: SeriesCache,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            cache: SeriesCache::new(ttl),
        }
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    async fn fetch_series(
        &self,
        instrument: &Instrument,
        timeframe: Timeframe,
        bar_count: usize,
    ) -> Result<PriceSeries, ProviderError> {
        if let Some(hit) = self.cache.get(instrument, timeframe, bar_count) {
            debug!(%instrument, %timeframe, "cache hit");
            return Ok(hit);
        }

        let series = self
            .inner
            .fetch_series(instrument, timeframe, bar_count)
            .await?;
        self.cache
            .insert(instrument, timeframe, bar_count, series.clone());

        Ok(series)
    }

    fn invalidate(&self) {
        self.cache.clear();
        self.inner.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PriceBar;
    use chrono::{TimeZone, Utc};

    fn series(close: f64) -> PriceSeries {
        PriceSeries::new(vec![PriceBar {
            time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
        }])
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = SeriesCache::new(Duration::from_secs(600));
        let eur = Instrument::new("EUR_USD");

        cache.insert(&eur, Timeframe::H1, 100, series(1.1));
        assert!(cache.get(&eur, Timeframe::H1, 100).is_some());

        tokio::time::advance(Duration::from_secs(599)).await;
        assert!(cache.get(&eur, Timeframe::H1, 100).is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get(&eur, Timeframe::H1, 100).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn keys_are_separated_by_timeframe_and_bar_count() {
        let cache = SeriesCache::new(Duration::from_secs(600));
        let eur = Instrument::new("EUR_USD");

        cache.insert(&eur, Timeframe::H1, 100, series(1.1));

        assert!(cache.get(&eur, Timeframe::H4, 100).is_none());
        assert!(cache.get(&eur, Timeframe::H1, 200).is_none());
        assert!(cache.get(&Instrument::new("GBP_USD"), Timeframe::H1, 100).is_none());
    }

    #[test]
    fn last_write_wins_and_clear_empties() {
        let cache = SeriesCache::new(Duration::from_secs(600));
        let eur = Instrument::new("EUR_USD");

        cache.insert(&eur, Timeframe::Daily, 100, series(1.1));
        cache.insert(&eur, Timeframe::Daily, 100, series(1.2));

        let got = cache.get(&eur, Timeframe::Daily, 100).unwrap();
        assert_eq!(got.closes(), vec![1.2]);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
