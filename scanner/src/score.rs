//! Priority scoring for the ranked opportunity list.
//!
//! A cell scores on two axes: how deep its reading sits inside a zone, and
//! whether a divergence is present (worth more when it points the same way
//! as the zone). Neutral cells without a divergence score zero and are left
//! out of the ranking.

use std::fmt;

use market::{Instrument, Timeframe};
use serde::Serialize;
use signals::{Divergence, Thresholds, Zone};

use crate::matrix::{ResultMatrix, SignalCell};

const ZONE_BASE: f64 = 40.0;
const ZONE_DEPTH: f64 = 40.0;
const DIVERGENCE: f64 = 20.0;
const AGREEMENT: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Bias {
    Long,
    Short,
    Mixed,
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Bias::Long => "Long",
            Bias::Short => "Short",
            Bias::Mixed => "Mixed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    pub instrument: Instrument,
    pub timeframe: Timeframe,
    pub rsi: Option<f64>,
    pub zone: Zone,
    pub divergence: Divergence,
    pub score: f64,
    pub bias: Bias,
}

/// Score in [0, 120] and the direction it argues for. `None` when the cell
/// carries no signal.
pub fn score_cell(cell: &SignalCell, thresholds: &Thresholds) -> Option<(f64, Bias)> {
    let zone = cell.zone(thresholds);

    let zone_side = match zone {
        Zone::Oversold => Some(Bias::Long),
        Zone::Overbought => Some(Bias::Short),
        _ => None,
    };
    let divergence_side = match cell.divergence {
        Divergence::Bullish => Some(Bias::Long),
        Divergence::Bearish => Some(Bias::Short),
        Divergence::None => None,
    };

    let mut score = 0.0;
    if zone_side.is_some() {
        score += ZONE_BASE + ZONE_DEPTH * thresholds.depth(cell.rsi);
    }
    if divergence_side.is_some() {
        score += DIVERGENCE;
    }

    let bias = match (zone_side, divergence_side) {
        (None, None) => return None,
        (Some(z), Some(d)) if z == d => {
            score += AGREEMENT;
            z
        }
        (Some(_), Some(_)) => Bias::Mixed,
        (Some(side), None) | (None, Some(side)) => side,
    };

    Some((score, bias))
}

/// Every signalling cell, best first. Equal scores keep matrix order.
pub fn rank(matrix: &ResultMatrix, thresholds: &Thresholds) -> Vec<Opportunity> {
    let mut ranked: Vec<Opportunity> = matrix
        .iter()
        .filter_map(|(instrument, timeframe, cell)| {
            let (score, bias) = score_cell(cell, thresholds)?;
            Some(Opportunity {
                instrument: instrument.clone(),
                timeframe,
                rsi: cell.rsi,
                zone: cell.zone(thresholds),
                divergence: cell.divergence,
                score,
                bias,
            })
        })
        .collect();

    // stable sort
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}
