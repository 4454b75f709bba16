//! Smoothing of gain/loss observations.
//!
//! Both methods consume a series where `None` marks "no observation" and
//! return an index-aligned series that stays `None` until `min_periods`
//! observations have been seen.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Smoothing {
    /// Exponentially weighted mean with center of mass `period - 1`
    /// (alpha = 1 / period), bias-adjusted weights.
    #[default]
    Wilder,
    /// Plain mean of the last `period` observations.
    Simple,
}

impl Smoothing {
    pub fn apply(&self, values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
        match self {
            Smoothing::Wilder => ewm_mean(values, period.saturating_sub(1) as f64, period),
            Smoothing::Simple => rolling_mean(values, period),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Smoothing::Wilder => "wilder",
            Smoothing::Simple => "simple",
        }
    }
}

impl fmt::Display for Smoothing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Smoothing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wilder" | "ewm" => Ok(Smoothing::Wilder),
            "simple" | "sma" => Ok(Smoothing::Simple),
            other => Err(format!("unknown smoothing: {other}")),
        }
    }
}

/// Adjusted exponentially weighted mean.
///
/// ```text
/// y_t = sum_i (1 - a)^i * x_{t-i} / sum_i (1 - a)^i,   a = 1 / (1 + com)
/// ```
///
/// Missing observations before the first value are skipped; later ones
/// repeat the previous output and still count as elapsed time.
pub fn ewm_mean(values: &[Option<f64>], com: f64, min_periods: usize) -> Vec<Option<f64>> {
    let decay = 1.0 - 1.0 / (1.0 + com);

    let mut out = Vec::with_capacity(values.len());
    let mut num = 0.0;
    let mut den = 0.0;
    let mut observed = 0usize;

    for v in values {
        match v {
            Some(x) => {
                num = x + decay * num;
                den = 1.0 + decay * den;
                observed += 1;
            }
            None if observed > 0 => {
                num *= decay;
                den *= decay;
            }
            None => {}
        }

        let ready = observed >= min_periods.max(1) && den > 0.0;
        out.push(ready.then(|| num / den));
    }

    out
}

/// Mean of the trailing `window` entries; `None` unless all are present.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let sum = slice.iter().copied().sum::<Option<f64>>()?;
            Some(sum / window as f64)
        })
        .collect()
}
