//! Relative Strength Index.
//!
//! ## Definition
//!
//! ```text
//! p_t      = representative price of bar t (OHLC4 or close)
//! d_t      = p_t - p_{t-1}                       (undefined at t = 0)
//! gain_t   = max(d_t, 0)
//! loss_t   = max(-d_t, 0)
//! G_t, L_t = smoothed gain / loss over `period` observations
//! rs_t     = G_t / L_t                           (+inf when L_t == 0)
//! rsi_t    = 100 - 100 / (1 + rs_t)
//! ```
//!
//! ## Warm-up
//! The first `period` entries of the output are undefined: one bar has no
//! difference and the smoother needs `period` observations. A series
//! shorter than `period + 1` bars yields no reading at all.
//!
//! ## Degenerate input
//! A zero smoothed loss saturates the oscillator at exactly 100 (this
//! includes a perfectly flat window). A non-finite representative price
//! (e.g. OHLC4 overflow) yields no reading.

use market::PriceSeries;
use serde::{Deserialize, Serialize};

use crate::price::PriceSource;
use crate::smoothing::Smoothing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsiParams {
    pub period: usize,
    pub source: PriceSource,
    pub smoothing: Smoothing,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: 10,
            source: PriceSource::Ohlc4,
            smoothing: Smoothing::Wilder,
        }
    }
}

/// Oscillator values index-aligned with the price series they came from.
/// `None` marks the unwarmed prefix.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct OscillatorSeries(Vec<Option<f64>>);

impl OscillatorSeries {
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied().flatten()
    }

    /// Most recent value, if defined.
    pub fn last(&self) -> Option<f64> {
        self.0.last().copied().flatten()
    }

    pub fn tail(&self, n: usize) -> &[Option<f64>] {
        let start = self.0.len().saturating_sub(n);
        &self.0[start..]
    }

    pub fn defined(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().flatten().copied()
    }
}

impl From<Vec<f64>> for OscillatorSeries {
    fn from(values: Vec<f64>) -> Self {
        Self(values.into_iter().map(Some).collect())
    }
}

/// Current reading plus the full history used for divergence checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RsiReading {
    pub current: f64,
    pub series: OscillatorSeries,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RsiCalculator {
    params: RsiParams,
}

impl RsiCalculator {
    pub fn new(params: RsiParams) -> Self {
        Self { params }
    }

    /// Computes the oscillator, or `None` when the series cannot support it.
    pub fn compute(&self, series: &PriceSeries) -> Option<RsiReading> {
        let period = self.params.period;
        if period == 0 || series.len() < period + 1 {
            return None;
        }

        let prices: Vec<f64> = series
            .bars()
            .iter()
            .map(|b| self.params.source.of(b))
            .collect();
        if prices.iter().any(|p| !p.is_finite()) {
            return None;
        }

        let (gains, losses) = split_changes(&prices);
        let avg_gain = self.params.smoothing.apply(&gains, period);
        let avg_loss = self.params.smoothing.apply(&losses, period);

        // Averages can overflow on extreme but finite prices; that is a
        // soft failure, not a NaN reading.
        let mut values = Vec::with_capacity(avg_gain.len());
        for (g, l) in avg_gain.iter().zip(&avg_loss) {
            let value = match (*g, *l) {
                (Some(g), Some(l)) => {
                    if !g.is_finite() || !l.is_finite() {
                        return None;
                    }
                    let v = rsi_from_averages(g, l);
                    if !v.is_finite() {
                        return None;
                    }
                    Some(v)
                }
                _ => None,
            };
            values.push(value);
        }

        let series = OscillatorSeries::new(values);
        let current = series.last()?;

        Some(RsiReading { current, series })
    }
}

/// Bar-to-bar gains and losses, index-aligned with `prices`.
fn split_changes(prices: &[f64]) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let mut gains = Vec::with_capacity(prices.len());
    let mut losses = Vec::with_capacity(prices.len());

    gains.push(None);
    losses.push(None);

    for w in prices.windows(2) {
        let d = w[1] - w[0];
        gains.push(Some(d.max(0.0)));
        losses.push(Some((-d).max(0.0)));
    }

    (gains, losses)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
