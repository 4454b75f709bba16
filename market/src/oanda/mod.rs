pub mod client;
pub mod types;

pub use client::OandaClient;
pub use types::{Candle, CandleMid, CandlesEnvelope};
