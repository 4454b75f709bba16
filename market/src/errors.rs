use thiserror::Error;

/// Structural problems with a price series. A provider that hits one of
/// these must fail the whole fetch rather than hand out partial data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    #[error("series contains no bars")]
    Empty,

    #[error("timestamps not strictly increasing at bar {index}")]
    NotIncreasing { index: usize },

    #[error("invalid price at bar {index}: {value}")]
    InvalidPrice { index: usize, value: f64 },
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request rejected: check the API key")]
    Unauthorized,

    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("no API key configured")]
    MissingCredentials,

    #[error("candle at {0} has no mid prices")]
    MissingMid(String),

    #[error("numeric parse error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),

    #[error("timestamp parse error: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("malformed series: {0}")]
    Series(#[from] SeriesError),
}
