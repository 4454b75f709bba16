pub mod cache;
pub mod errors;
pub mod oanda;
pub mod provider;
pub mod types;

pub use cache::{CachedProvider, SeriesCache};
pub use errors::{ProviderError, SeriesError};
pub use provider::MarketDataProvider;
pub use types::{Instrument, ParseTimeframeError, PriceBar, PriceSeries, Timeframe};
