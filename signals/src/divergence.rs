//! Price / oscillator divergence.
//!
//! ## What it answers
//! > "Did price make a new extreme that momentum failed to confirm?"
//!
//! Only the trailing `lookback` bars are inspected, and only the two most
//! recent swing points on each side are compared:
//!
//! - **Bearish**: the later High peak is strictly above the earlier one while
//!   the oscillator at the later peak is strictly below its value at the
//!   earlier peak.
//! - **Bullish**: the later Low trough is strictly below the earlier one while
//!   the oscillator at the later trough is strictly above its value at the
//!   earlier trough.
//!
//! The bearish side is evaluated first and wins when both trigger.
//!
//! ## Soft failures
//! Missing oscillator, a price series shorter than `lookback`, or an
//! oscillator not aligned 1:1 with the prices all yield
//! [`Divergence::None`]. An undefined oscillator value at a swing point
//! never satisfies a comparison.

use std::fmt;

use market::{PriceBar, PriceSeries};
use serde::{Deserialize, Serialize};

use crate::peaks::{find_peaks, find_troughs};
use crate::rsi::OscillatorSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Divergence {
    #[default]
    None,
    Bullish,
    Bearish,
}

impl Divergence {
    pub fn is_some(&self) -> bool {
        !matches!(self, Divergence::None)
    }

    /// Directional arrow, empty when there is no divergence.
    pub fn arrow(&self) -> &'static str {
        match self {
            Divergence::None => "",
            Divergence::Bullish => "↑",
            Divergence::Bearish => "↓",
        }
    }
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Divergence::None => "None",
            Divergence::Bullish => "Bullish",
            Divergence::Bearish => "Bearish",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivergenceParams {
    /// Trailing bars inspected.
    pub lookback: usize,
    /// Minimum bars between two swing points on the same side.
    pub peak_distance: usize,
}

impl Default for DivergenceParams {
    fn default() -> Self {
        Self {
            lookback: 30,
            peak_distance: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DivergenceDetector {
    params: DivergenceParams,
}

impl DivergenceDetector {
    pub fn new(params: DivergenceParams) -> Self {
        Self { params }
    }

    pub fn detect(&self, series: &PriceSeries, oscillator: Option<&OscillatorSeries>) -> Divergence {
        let Some(oscillator) = oscillator else {
            return Divergence::None;
        };

        let lookback = self.params.lookback;
        if lookback == 0 || series.len() < lookback || oscillator.len() != series.len() {
            return Divergence::None;
        }

        let bars = series.tail(lookback);
        let osc = oscillator.tail(lookback);

        if self.is_bearish(bars, osc) {
            Divergence::Bearish
        } else if self.is_bullish(bars, osc) {
            Divergence::Bullish
        } else {
            Divergence::None
        }
    }

    fn is_bearish(&self, bars: &[PriceBar], osc: &[Option<f64>]) -> bool {
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let Some((prev, last)) = last_two(&find_peaks(&highs, self.params.peak_distance)) else {
            return false;
        };

        match (osc[prev], osc[last]) {
            (Some(o_prev), Some(o_last)) => highs[last] > highs[prev] && o_last < o_prev,
            _ => false,
        }
    }

    fn is_bullish(&self, bars: &[PriceBar], osc: &[Option<f64>]) -> bool {
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let Some((prev, last)) = last_two(&find_troughs(&lows, self.params.peak_distance)) else {
            return false;
        };

        match (osc[prev], osc[last]) {
            (Some(o_prev), Some(o_last)) => lows[last] < lows[prev] && o_last > o_prev,
            _ => false,
        }
    }
}

fn last_two(indices: &[usize]) -> Option<(usize, usize)> {
    match indices {
        [.., a, b] => Some((*a, *b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const LEN: usize = 30;

    /// Flat market: highs 100, lows 95, unless overridden.
    fn series_with(highs: &[(usize, f64)], lows: &[(usize, f64)]) -> PriceSeries {
        let bars = (0..LEN)
            .map(|i| {
                let high = highs.iter().find(|(j, _)| *j == i).map_or(100.0, |h| h.1);
                let low = lows.iter().find(|(j, _)| *j == i).map_or(95.0, |l| l.1);
                PriceBar {
                    time: Utc.timestamp_opt(1_700_000_000 + i as i64 * 3_600, 0).unwrap(),
                    open: 97.0,
                    high,
                    low,
                    close: 97.0,
                }
            })
            .collect();
        PriceSeries::new(bars).unwrap()
    }

    fn osc_with(points: &[(usize, f64)]) -> OscillatorSeries {
        let values = (0..LEN)
            .map(|i| points.iter().find(|(j, _)| *j == i).map_or(50.0, |p| p.1))
            .collect::<Vec<_>>();
        OscillatorSeries::from(values)
    }

    fn detector() -> DivergenceDetector {
        DivergenceDetector::new(DivergenceParams {
            lookback: 30,
            peak_distance: 5,
        })
    }

    #[test]
    fn higher_high_with_lower_oscillator_is_bearish() {
        let s = series_with(&[(5, 110.0), (25, 115.0)], &[]);
        let o = osc_with(&[(5, 70.0), (25, 60.0)]);

        assert_eq!(detector().detect(&s, Some(&o)), Divergence::Bearish);
    }

    #[test]
    fn lower_low_with_higher_oscillator_is_bullish() {
        let s = series_with(&[], &[(5, 90.0), (25, 85.0)]);
        let o = osc_with(&[(5, 25.0), (25, 35.0)]);

        assert_eq!(detector().detect(&s, Some(&o)), Divergence::Bullish);
    }

    #[test]
    fn confirmed_move_is_not_a_divergence() {
        let s = series_with(&[(5, 110.0), (25, 115.0)], &[]);
        let o = osc_with(&[(5, 60.0), (25, 70.0)]);

        assert_eq!(detector().detect(&s, Some(&o)), Divergence::None);
    }

    #[test]
    fn equal_highs_do_not_qualify() {
        let s = series_with(&[(5, 110.0), (25, 110.0)], &[]);
        let o = osc_with(&[(5, 70.0), (25, 60.0)]);

        assert_eq!(detector().detect(&s, Some(&o)), Divergence::None);
    }

    #[test]
    fn bearish_wins_when_both_sides_trigger() {
        let s = series_with(&[(5, 110.0), (25, 115.0)], &[(8, 90.0), (20, 85.0)]);
        let o = osc_with(&[(5, 70.0), (25, 60.0), (8, 25.0), (20, 35.0)]);

        assert_eq!(detector().detect(&s, Some(&o)), Divergence::Bearish);
    }

    #[test]
    fn only_the_two_most_recent_peaks_matter() {
        // 5 -> 15 diverges, 15 -> 25 is confirmed.
        let s = series_with(&[(5, 110.0), (15, 115.0), (25, 120.0)], &[]);
        let o = osc_with(&[(5, 70.0), (15, 60.0), (25, 65.0)]);

        assert_eq!(detector().detect(&s, Some(&o)), Divergence::None);
    }

    #[test]
    fn missing_oscillator_yields_none() {
        let s = series_with(&[(5, 110.0), (25, 115.0)], &[]);
        assert_eq!(detector().detect(&s, None), Divergence::None);
    }

    #[test]
    fn series_shorter_than_lookback_yields_none() {
        let s = series_with(&[(5, 110.0), (25, 115.0)], &[]);
        let o = osc_with(&[(5, 70.0), (25, 60.0)]);
        let d = DivergenceDetector::new(DivergenceParams {
            lookback: 31,
            peak_distance: 5,
        });

        assert_eq!(d.detect(&s, Some(&o)), Divergence::None);
    }

    #[test]
    fn misaligned_oscillator_yields_none() {
        let s = series_with(&[(5, 110.0), (25, 115.0)], &[]);
        let o = OscillatorSeries::from(vec![50.0; LEN - 1]);

        assert_eq!(detector().detect(&s, Some(&o)), Divergence::None);
    }

    #[test]
    fn undefined_oscillator_at_a_peak_yields_none() {
        let s = series_with(&[(5, 110.0), (25, 115.0)], &[]);
        let mut values: Vec<Option<f64>> = vec![Some(50.0); LEN];
        values[5] = None;
        values[25] = Some(40.0);

        assert_eq!(
            detector().detect(&s, Some(&OscillatorSeries::new(values))),
            Divergence::None
        );
    }

    #[test]
    fn peaks_closer_than_distance_collapse() {
        // 22 and 25 are within 5 bars; only 25 survives, leaving one peak.
        let s = series_with(&[(22, 112.0), (25, 115.0)], &[]);
        let o = osc_with(&[(22, 70.0), (25, 60.0)]);

        assert_eq!(detector().detect(&s, Some(&o)), Divergence::None);
    }

    #[test]
    fn labels_render() {
        assert_eq!(Divergence::Bullish.arrow(), "↑");
        assert_eq!(Divergence::Bearish.arrow(), "↓");
        assert_eq!(Divergence::None.arrow(), "");
        assert!(!Divergence::None.is_some());
        assert_eq!(Divergence::Bearish.to_string(), "Bearish");
    }
}
