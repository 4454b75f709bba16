//! Signal aggregator.
//!
//! Fans (instrument, timeframe) units out over a bounded pool of tokio
//! tasks. Each unit fetches one series, runs the [`SignalPipeline`] and
//! reports back its slot coordinates; the collector writes cells into a
//! pre-sized [`ResultMatrix`], so completion order never affects the result.
//!
//! A failed fetch leaves its cell unavailable and is logged; it never aborts
//! the scan.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use common::logger::{TraceId, cell_span, root_span, warn_if_slow};
use market::{Instrument, MarketDataProvider, Timeframe};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument as _, Span, debug, info, warn};

use crate::config::ScreenerConfig;
use crate::matrix::{ResultMatrix, SignalCell};
use crate::pipeline::SignalPipeline;
use crate::state::AppState;

/// Fetches slower than this are reported on the `performance` target.
const SLOW_FETCH: Duration = Duration::from_secs(3);

/// One completed scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub trace_id: TraceId,
    pub generation: u64,
    pub scanned_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub matrix: ResultMatrix,
    /// Units whose fetch failed (their cells are unavailable).
    pub failed_fetches: usize,
}

struct UnitResult {
    row: usize,
    col: usize,
    cell: SignalCell,
    fetched: bool,
}

pub struct Screener<P: MarketDataProvider> {
    provider: Arc<P>,
    pipeline: SignalPipeline,
    instruments: Vec<Instrument>,
    timeframes: Vec<Timeframe>,
    bar_count: usize,
    workers: usize,
    state: AppState,
}

impl<P: MarketDataProvider> Screener<P> {
    pub fn new(provider: Arc<P>, cfg: &ScreenerConfig, state: AppState) -> Self {
        Self {
            provider,
            pipeline: SignalPipeline::from_config(cfg),
            instruments: cfg.instruments.clone(),
            timeframes: cfg.timeframes.clone(),
            bar_count: cfg.bar_count,
            workers: cfg.workers.max(1),
            state,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Scans the configured universe and publishes the outcome.
    pub async fn scan(&self) -> ScanOutcome {
        let generation = self.state.begin_scan();
        let outcome = self.run(generation).await;
        self.state.commit(outcome.clone()).await;
        outcome
    }

    /// Drops cached data, then scans from scratch.
    pub async fn rescan(&self) -> ScanOutcome {
        self.provider.invalidate();
        self.scan().await
    }

    async fn run(&self, generation: u64) -> ScanOutcome {
        let trace_id = TraceId::new();
        let span = root_span("scan", &trace_id);
        span.record("generation", generation);

        let started = Instant::now();
        let (matrix, failed_fetches) = self.fan_out().instrument(span).await;
        let elapsed = started.elapsed();

        info!(
            %trace_id,
            generation,
            cells = matrix.len(),
            failed_fetches,
            elapsed_ms = elapsed.as_millis() as u64,
            "scan complete"
        );

        ScanOutcome {
            trace_id,
            generation,
            scanned_at: Utc::now(),
            elapsed,
            matrix,
            failed_fetches,
        }
    }

    async fn fan_out(&self) -> (ResultMatrix, usize) {
        let mut matrix = ResultMatrix::new(self.instruments.clone(), self.timeframes.clone());
        let permits = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        info!(
            instruments = self.instruments.len(),
            timeframes = self.timeframes.len(),
            workers = self.workers,
            "scan started"
        );

        for (row, instrument) in self.instruments.iter().enumerate() {
            for (col, &timeframe) in self.timeframes.iter().enumerate() {
                let provider = Arc::clone(&self.provider);
                let permits = Arc::clone(&permits);
                let instrument = instrument.clone();
                let pipeline = self.pipeline;
                let bar_count = self.bar_count;
                let span = cell_span(instrument.as_str(), timeframe.label());

                tasks.spawn(
                    async move {
                        let Ok(_permit) = permits.acquire_owned().await else {
                            return UnitResult {
                                row,
                                col,
                                cell: SignalCell::unavailable(),
                                fetched: false,
                            };
                        };

                        let fetched = warn_if_slow(
                            "fetch_series",
                            SLOW_FETCH,
                            provider.fetch_series(&instrument, timeframe, bar_count),
                        )
                        .await;

                        match fetched {
                            Ok(series) => {
                                Span::current().record("bars", series.len());
                                let cell = pipeline.evaluate(Some(&series));
                                debug!(rsi = ?cell.rsi, divergence = %cell.divergence, "cell computed");
                                UnitResult {
                                    row,
                                    col,
                                    cell,
                                    fetched: true,
                                }
                            }
                            Err(e) => {
                                warn!(error = %e, "fetch failed; cell left unavailable");
                                UnitResult {
                                    row,
                                    col,
                                    cell: pipeline.evaluate(None),
                                    fetched: false,
                                }
                            }
                        }
                    }
                    .instrument(span),
                );
            }
        }

        let mut failed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(unit) => {
                    if !unit.fetched {
                        failed += 1;
                    }
                    matrix.set(unit.row, unit.col, unit.cell);
                }
                Err(e) => {
                    failed += 1;
                    warn!(error = ?e, "scan unit aborted");
                }
            }
        }

        (matrix, failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use market::{PriceSeries, ProviderError};
    use tracing_test::traced_test;

    struct AlwaysDown;

    #[async_trait]
    impl MarketDataProvider for AlwaysDown {
        async fn fetch_series(
            &self,
            instrument: &Instrument,
            _timeframe: Timeframe,
            _bar_count: usize,
        ) -> Result<PriceSeries, ProviderError> {
            Err(ProviderError::UnknownInstrument(instrument.to_string()))
        }
    }

    fn cfg() -> ScreenerConfig {
        ScreenerConfig {
            instruments: vec![Instrument::new("EUR_USD"), Instrument::new("USD_JPY")],
            timeframes: vec![Timeframe::H1, Timeframe::H4],
            ..ScreenerConfig::default()
        }
    }

    #[traced_test]
    #[tokio::test]
    async fn failed_fetches_are_logged_and_counted() {
        let screener = Screener::new(Arc::new(AlwaysDown), &cfg(), AppState::new());

        let outcome = screener.scan().await;

        assert_eq!(outcome.failed_fetches, 4);
        assert_eq!(outcome.generation, 1);
        assert!(outcome.matrix.iter().all(|(_, _, c)| !c.is_available()));
        assert!(logs_contain("fetch failed; cell left unavailable"));
        assert!(logs_contain("unknown instrument: USD_JPY"));
    }
}
