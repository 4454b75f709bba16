use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{Span, field};

use super::TraceId;

/// Root span for one full scan of the instrument universe.
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "scan",
        name = %name,
        trace_id = %trace_id,
        generation = field::Empty
    )
}

/// Child span for a single (instrument, timeframe) unit of work.
pub fn cell_span(instrument: &str, timeframe: &str) -> Span {
    tracing::info_span!(
        "cell",
        instrument = %instrument,
        timeframe = %timeframe,
        bars = field::Empty
    )
}

pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
