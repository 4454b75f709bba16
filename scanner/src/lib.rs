pub mod aggregator;
pub mod config;
pub mod error;
pub mod matrix;
pub mod pipeline;
pub mod report;
pub mod score;
pub mod state;
pub mod stats;

pub use aggregator::{ScanOutcome, Screener};
pub use config::ScreenerConfig;
pub use error::ConfigError;
pub use matrix::{ResultMatrix, SignalCell};
pub use pipeline::SignalPipeline;
pub use state::AppState;
