use std::fmt;

use market::Timeframe;
use serde::Serialize;
use signals::{Divergence, Thresholds, Zone};

use crate::matrix::ResultMatrix;

/// Signal counts for one timeframe column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeframeStats {
    pub timeframe: Timeframe,
    /// Cells with a defined reading.
    pub readings: usize,
    pub oversold: usize,
    pub overbought: usize,
    pub bullish: usize,
    pub bearish: usize,
}

impl TimeframeStats {
    /// Sum of zone hits and divergences, `None` when the column has no
    /// defined reading at all.
    pub fn total_signals(&self) -> Option<usize> {
        (self.readings > 0).then_some(self.oversold + self.overbought + self.bullish + self.bearish)
    }
}

impl fmt::Display for TimeframeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total_signals() {
            None => write!(f, "{:<7} N/A (no data)", self.timeframe.label()),
            Some(total) => write!(
                f,
                "{:<7} {:>3} signals | {} oversold | {} overbought | ↑ {} | ↓ {}",
                self.timeframe.label(),
                total,
                self.oversold,
                self.overbought,
                self.bullish,
                self.bearish,
            ),
        }
    }
}

/// One entry per matrix column, in column order.
pub fn compute(matrix: &ResultMatrix, thresholds: &Thresholds) -> Vec<TimeframeStats> {
    matrix
        .timeframes()
        .iter()
        .map(|&timeframe| {
            let mut stats = TimeframeStats {
                timeframe,
                readings: 0,
                oversold: 0,
                overbought: 0,
                bullish: 0,
                bearish: 0,
            };
            for cell in matrix.column(timeframe) {
                match cell.zone(thresholds) {
                    Zone::Oversold => stats.oversold += 1,
                    Zone::Overbought => stats.overbought += 1,
                    _ => {}
                }
                if cell.is_available() {
                    stats.readings += 1;
                }
                match cell.divergence {
                    Divergence::Bullish => stats.bullish += 1,
                    Divergence::Bearish => stats.bearish += 1,
                    Divergence::None => {}
                }
            }
            stats
        })
        .collect()
}
