//! Pure signal core: momentum oscillator and price/oscillator divergence.
//!
//! Nothing in this crate performs I/O or holds state between calls.
//! Insufficient or degenerate input is a soft failure (`None` /
//! [`Divergence::None`]), never an error.

pub mod divergence;
pub mod peaks;
pub mod price;
pub mod rsi;
pub mod smoothing;
pub mod zone;

pub use divergence::{Divergence, DivergenceDetector, DivergenceParams};
pub use price::PriceSource;
pub use rsi::{OscillatorSeries, RsiCalculator, RsiParams, RsiReading};
pub use smoothing::Smoothing;
pub use zone::{ThresholdError, Thresholds, Zone};
