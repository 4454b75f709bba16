//! Text surfaces over a [`ScanOutcome`]: the terminal table, a markdown
//! report with the ranked opportunity list, and a JSON export.
//!
//! Everything here is a pure function of the outcome and the configured
//! thresholds; nothing is recomputed from prices.

use std::fmt;

use chrono::{DateTime, Utc};
use market::{Instrument, Timeframe};
use serde::Serialize;
use signals::{Divergence, Thresholds, Zone};

use crate::aggregator::ScanOutcome;
use crate::config::ScreenerConfig;
use crate::matrix::{ResultMatrix, SignalCell};
use crate::score::{self, Opportunity};
use crate::stats::{self, TimeframeStats};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

pub fn format_rsi(rsi: Option<f64>) -> String {
    match rsi {
        Some(v) => format!("{v:.1}"),
        None => "N/A".to_string(),
    }
}

fn zone_tag(zone: Zone) -> &'static str {
    match zone {
        Zone::Oversold => "OS",
        Zone::Overbought => "OB",
        Zone::Neutral | Zone::Unavailable => "",
    }
}

/// `18.4 OS ↑`, `55.0`, `N/A`. Unavailable cells never show an arrow.
pub fn format_cell(cell: &SignalCell, thresholds: &Thresholds) -> String {
    if !cell.is_available() {
        return format_rsi(None);
    }
    [
        format_rsi(cell.rsi),
        zone_tag(cell.zone(thresholds)).to_string(),
        cell.divergence.arrow().to_string(),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

pub fn legend(thresholds: &Thresholds) -> String {
    format!(
        "OS = oversold (RSI ≤ {}) | OB = overbought (RSI ≥ {}) | ↑ bullish divergence | ↓ bearish divergence",
        thresholds.oversold(),
        thresholds.overbought()
    )
}

pub fn last_update(scanned_at: DateTime<Utc>) -> String {
    format!("Last update: {} (data from OANDA)", scanned_at.format(TIME_FORMAT))
}

/// Fixed-width grid, one row per instrument.
pub struct Table<'a> {
    pub matrix: &'a ResultMatrix,
    pub thresholds: &'a Thresholds,
}

impl fmt::Display for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const FIRST: usize = 10;
        const WIDTH: usize = 13;

        write!(f, "{:<FIRST$}", "Instrument")?;
        for tf in self.matrix.timeframes() {
            write!(f, "{:>WIDTH$}", tf.label())?;
        }
        writeln!(f)?;
        writeln!(f, "{}", "-".repeat(FIRST + WIDTH * self.matrix.timeframes().len()))?;

        for (instrument, cells) in self.matrix.rows() {
            write!(f, "{:<FIRST$}", instrument.display_name())?;
            for cell in cells {
                write!(f, "{:>WIDTH$}", format_cell(cell, self.thresholds))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Per-timeframe statistics, one line each.
pub struct StatsBlock<'a>(pub &'a [TimeframeStats]);

impl fmt::Display for StatsBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Signal statistics")?;
        for s in self.0 {
            writeln!(f, "  {s}")?;
        }
        Ok(())
    }
}

/// Everything the terminal shows after a scan.
pub fn render_terminal(outcome: &ScanOutcome, thresholds: &Thresholds) -> String {
    let stats = stats::compute(&outcome.matrix, thresholds);
    let mut out = String::new();

    out.push_str(&last_update(outcome.scanned_at));
    out.push_str("\n\n");
    out.push_str(
        &Table {
            matrix: &outcome.matrix,
            thresholds,
        }
        .to_string(),
    );
    out.push('\n');
    out.push_str(&legend(thresholds));
    out.push_str("\n\n");
    out.push_str(&StatsBlock(&stats).to_string());

    if outcome.failed_fetches > 0 {
        out.push_str(&format!(
            "\n{} of {} fetches failed; those cells show N/A\n",
            outcome.failed_fetches,
            outcome.matrix.len()
        ));
    }
    out
}

/// Markdown document: parameters, ranked opportunities, statistics and the
/// full matrix as an appendix.
pub struct MarkdownReport<'a> {
    pub outcome: &'a ScanOutcome,
    pub config: &'a ScreenerConfig,
}

impl MarkdownReport<'_> {
    fn write_ranking(&self, f: &mut fmt::Formatter<'_>, ranked: &[Opportunity]) -> fmt::Result {
        writeln!(f, "## Ranked opportunities\n")?;
        if ranked.is_empty() {
            return writeln!(f, "_No instrument is in a zone or diverging._\n");
        }

        writeln!(f, "| # | Instrument | Timeframe | RSI | Zone | Divergence | Bias | Score |")?;
        writeln!(f, "|---|---|---|---:|---|---|---|---:|")?;
        for (i, o) in ranked.iter().enumerate() {
            writeln!(
                f,
                "| {} | {} | {} | {} | {} | {} {} | {} | {:.1} |",
                i + 1,
                o.instrument.display_name(),
                o.timeframe,
                format_rsi(o.rsi),
                o.zone,
                o.divergence,
                o.divergence.arrow(),
                o.bias,
                o.score,
            )?;
        }
        writeln!(f)
    }

    fn write_stats(&self, f: &mut fmt::Formatter<'_>, stats: &[TimeframeStats]) -> fmt::Result {
        writeln!(f, "## Signal statistics\n")?;
        writeln!(f, "| Timeframe | Signals | Oversold | Overbought | Bullish ↑ | Bearish ↓ |")?;
        writeln!(f, "|---|---:|---:|---:|---:|---:|")?;
        for s in stats {
            let total = s
                .total_signals()
                .map_or_else(|| "N/A".to_string(), |t| t.to_string());
            writeln!(
                f,
                "| {} | {} | {} | {} | {} | {} |",
                s.timeframe, total, s.oversold, s.overbought, s.bullish, s.bearish
            )?;
        }
        writeln!(f)
    }

    fn write_appendix(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let matrix = &self.outcome.matrix;
        let thresholds = &self.config.thresholds;

        writeln!(f, "## Appendix: full matrix\n")?;
        write!(f, "| Instrument |")?;
        for tf in matrix.timeframes() {
            write!(f, " {tf} |")?;
        }
        writeln!(f)?;
        write!(f, "|---|")?;
        for _ in matrix.timeframes() {
            write!(f, "---:|")?;
        }
        writeln!(f)?;

        for (instrument, cells) in matrix.rows() {
            write!(f, "| {} |", instrument.display_name())?;
            for cell in cells {
                write!(f, " {} |", format_cell(cell, thresholds))?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", legend(thresholds))
    }
}

impl fmt::Display for MarkdownReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cfg = self.config;
        let outcome = self.outcome;
        let ranked = score::rank(&outcome.matrix, &cfg.thresholds);
        let stats = stats::compute(&outcome.matrix, &cfg.thresholds);

        writeln!(f, "# RSI & Divergence Screener\n")?;
        writeln!(
            f,
            "- Scanned at: {} (generation {}, trace `{}`)",
            outcome.scanned_at.format(TIME_FORMAT),
            outcome.generation,
            outcome.trace_id
        )?;
        writeln!(
            f,
            "- RSI: period {}, {} price, {} smoothing",
            cfg.rsi.period, cfg.rsi.source, cfg.rsi.smoothing
        )?;
        writeln!(
            f,
            "- Zones: oversold ≤ {}, overbought ≥ {}",
            cfg.thresholds.oversold(),
            cfg.thresholds.overbought()
        )?;
        writeln!(
            f,
            "- Divergence: lookback {} bars, peak distance {}",
            cfg.divergence.lookback, cfg.divergence.peak_distance
        )?;
        writeln!(
            f,
            "- Universe: {} instruments × {} timeframes, {} failed fetches\n",
            outcome.matrix.instruments().len(),
            outcome.matrix.timeframes().len(),
            outcome.failed_fetches
        )?;

        self.write_ranking(f, &ranked)?;
        self.write_stats(f, &stats)?;
        self.write_appendix(f)
    }
}

#[derive(Serialize)]
struct CellExport<'a> {
    instrument: &'a Instrument,
    timeframe: Timeframe,
    rsi: Option<f64>,
    zone: Zone,
    divergence: Divergence,
}

#[derive(Serialize)]
struct ScanExport<'a> {
    trace_id: String,
    generation: u64,
    scanned_at: DateTime<Utc>,
    elapsed_ms: u64,
    failed_fetches: usize,
    oversold: f64,
    overbought: f64,
    instruments: &'a [Instrument],
    timeframes: &'a [Timeframe],
    cells: Vec<CellExport<'a>>,
    stats: Vec<TimeframeStats>,
    ranked: Vec<Opportunity>,
}

/// Pretty JSON of the outcome; cells in matrix order.
pub fn to_json(outcome: &ScanOutcome, thresholds: &Thresholds) -> serde_json::Result<String> {
    let matrix = &outcome.matrix;
    let export = ScanExport {
        trace_id: outcome.trace_id.to_string(),
        generation: outcome.generation,
        scanned_at: outcome.scanned_at,
        elapsed_ms: outcome.elapsed.as_millis() as u64,
        failed_fetches: outcome.failed_fetches,
        oversold: thresholds.oversold(),
        overbought: thresholds.overbought(),
        instruments: matrix.instruments(),
        timeframes: matrix.timeframes(),
        cells: matrix
            .iter()
            .map(|(instrument, timeframe, cell)| CellExport {
                instrument,
                timeframe,
                rsi: cell.rsi,
                zone: cell.zone(thresholds),
                divergence: cell.divergence,
            })
            .collect(),
        stats: stats::compute(matrix, thresholds),
        ranked: score::rank(matrix, thresholds),
    };
    serde_json::to_string_pretty(&export)
}
