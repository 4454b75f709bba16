use thiserror::Error;

use signals::ThresholdError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("divergence lookback must be at least 3 bars, got {0}")]
    LookbackTooShort(usize),

    #[error("bar count {bar_count} cannot cover the divergence lookback {lookback}")]
    BarCountTooSmall { bar_count: usize, lookback: usize },

    #[error("instrument universe is empty")]
    NoInstruments,

    #[error("no timeframes selected")]
    NoTimeframes,

    #[error(transparent)]
    Thresholds(#[from] ThresholdError),
}
