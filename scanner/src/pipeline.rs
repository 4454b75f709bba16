use market::PriceSeries;
use signals::{DivergenceDetector, RsiCalculator};

use crate::config::ScreenerConfig;
use crate::matrix::SignalCell;

/// Oscillator then divergence for one price series.
///
/// The detector only runs when the oscillator produced a reading.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalPipeline {
    calculator: RsiCalculator,
    detector: DivergenceDetector,
}

impl SignalPipeline {
    pub fn new(calculator: RsiCalculator, detector: DivergenceDetector) -> Self {
        Self {
            calculator,
            detector,
        }
    }

    pub fn from_config(cfg: &ScreenerConfig) -> Self {
        Self::new(
            RsiCalculator::new(cfg.rsi),
            DivergenceDetector::new(cfg.divergence),
        )
    }

    pub fn evaluate(&self, series: Option<&PriceSeries>) -> SignalCell {
        let Some(series) = series else {
            return SignalCell::unavailable();
        };
        let Some(reading) = self.calculator.compute(series) else {
            return SignalCell::unavailable();
        };

        SignalCell {
            rsi: Some(reading.current),
            divergence: self.detector.detect(series, Some(&reading.series)),
        }
    }
}
