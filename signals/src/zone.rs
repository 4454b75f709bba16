use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Oversold,
    Neutral,
    Overbought,
    /// No defined reading.
    Unavailable,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Zone::Oversold => "oversold",
            Zone::Neutral => "neutral",
            Zone::Overbought => "overbought",
            Zone::Unavailable => "n/a",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThresholdError {
    #[error("threshold {0} outside [0, 100]")]
    OutOfRange(f64),

    #[error("oversold ({oversold}) must be below overbought ({overbought})")]
    Inverted { oversold: f64, overbought: f64 },
}

/// Oversold / overbought bounds, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    oversold: f64,
    overbought: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            oversold: 20.0,
            overbought: 80.0,
        }
    }
}

impl Thresholds {
    pub fn new(oversold: f64, overbought: f64) -> Result<Self, ThresholdError> {
        for v in [oversold, overbought] {
            if !(0.0..=100.0).contains(&v) {
                return Err(ThresholdError::OutOfRange(v));
            }
        }
        if oversold >= overbought {
            return Err(ThresholdError::Inverted {
                oversold,
                overbought,
            });
        }
        Ok(Self {
            oversold,
            overbought,
        })
    }

    pub fn oversold(&self) -> f64 {
        self.oversold
    }

    pub fn overbought(&self) -> f64 {
        self.overbought
    }

    pub fn classify(&self, value: Option<f64>) -> Zone {
        match value {
            None => Zone::Unavailable,
            Some(v) if v <= self.oversold => Zone::Oversold,
            Some(v) if v >= self.overbought => Zone::Overbought,
            Some(_) => Zone::Neutral,
        }
    }

    /// How far past its threshold a reading sits, scaled to [0, 1] by the
    /// room between the threshold and the bound. Zero outside both zones.
    pub fn depth(&self, value: Option<f64>) -> f64 {
        let Some(v) = value else {
            return 0.0;
        };
        let (past, room) = match self.classify(value) {
            Zone::Oversold => (self.oversold - v, self.oversold),
            Zone::Overbought => (v - self.overbought, 100.0 - self.overbought),
            _ => return 0.0,
        };
        if room <= 0.0 {
            1.0
        } else {
            (past / room).clamp(0.0, 1.0)
        }
    }
}
