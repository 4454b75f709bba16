use market::{Instrument, Timeframe};
use serde::Serialize;
use signals::{Divergence, Thresholds, Zone};

/// Outcome for one (instrument, timeframe). `rsi` is `None` when no signal
/// could be computed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SignalCell {
    pub rsi: Option<f64>,
    pub divergence: Divergence,
}

impl SignalCell {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        self.rsi.is_some()
    }

    pub fn zone(&self, thresholds: &Thresholds) -> Zone {
        thresholds.classify(self.rsi)
    }
}

/// Instrument × timeframe grid in canonical order.
///
/// Slots are allocated up front; filling them in any order yields the same
/// matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMatrix {
    instruments: Vec<Instrument>,
    timeframes: Vec<Timeframe>,
    cells: Vec<SignalCell>,
}

impl ResultMatrix {
    pub fn new(instruments: Vec<Instrument>, timeframes: Vec<Timeframe>) -> Self {
        let cells = vec![SignalCell::unavailable(); instruments.len() * timeframes.len()];
        Self {
            instruments,
            timeframes,
            cells,
        }
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn timeframes(&self) -> &[Timeframe] {
        &self.timeframes
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Writes one slot. Out-of-range coordinates are ignored.
    pub fn set(&mut self, row: usize, col: usize, cell: SignalCell) {
        if row < self.instruments.len() && col < self.timeframes.len() {
            let idx = row * self.timeframes.len() + col;
            self.cells[idx] = cell;
        }
    }

    pub fn cell_at(&self, row: usize, col: usize) -> Option<&SignalCell> {
        if col >= self.timeframes.len() {
            return None;
        }
        self.cells.get(row * self.timeframes.len() + col)
    }

    pub fn get_cell(&self, instrument: &Instrument, timeframe: Timeframe) -> Option<&SignalCell> {
        let row = self.instruments.iter().position(|i| i == instrument)?;
        let col = self.timeframes.iter().position(|t| *t == timeframe)?;
        self.cell_at(row, col)
    }

    /// Lookup by column label (`H1`, `Daily`, ...) or provider code (`D`).
    pub fn get_cell_by_label(&self, instrument: &Instrument, label: &str) -> Option<&SignalCell> {
        self.get_cell(instrument, label.parse().ok()?)
    }

    /// Rows in instrument order, each with its cells in timeframe order.
    pub fn rows(&self) -> impl Iterator<Item = (&Instrument, &[SignalCell])> {
        let width = self.timeframes.len().max(1);
        self.instruments.iter().zip(self.cells.chunks(width))
    }

    /// All cells of one timeframe in instrument order.
    pub fn column(&self, timeframe: Timeframe) -> Vec<SignalCell> {
        let Some(col) = self.timeframes.iter().position(|t| *t == timeframe) else {
            return Vec::new();
        };
        self.rows().map(|(_, cells)| cells[col]).collect()
    }

    /// Iterates `(instrument, timeframe, cell)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&Instrument, Timeframe, &SignalCell)> {
        self.rows().flat_map(move |(inst, cells)| {
            self.timeframes
                .iter()
                .zip(cells)
                .map(move |(tf, cell)| (inst, *tf, cell))
        })
    }
}
