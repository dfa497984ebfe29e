use thiserror::Error as ThisError;

/// Failures of a single series fetch. Recovered locally by the chart: the
/// previous samples stay on screen and the message is shown as a banner.
#[derive(ThisError, Debug)]
pub enum FetchError {
    #[error("invalid source config: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api error {code}: {msg}")]
    Api { code: i64, msg: String },

    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid sample at {timestamp_ms}: ratio {ratio}")]
    InvalidSample { timestamp_ms: i64, ratio: f64 },
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

#[derive(ThisError, Debug)]
pub enum ExportError {
    #[error("nothing to rasterize: {0}")]
    Rasterize(String),

    #[error("png encode failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("bad data url: {0}")]
    DataUrl(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
}

impl From<arboard::Error> for ExportError {
    fn from(err: arboard::Error) -> Self {
        ExportError::Clipboard(err.to_string())
    }
}

#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
#[error("unknown period {0:?} (expected one of 5m 15m 30m 1h 2h 4h 6h 12h 1d)")]
pub struct ParsePeriodError(pub String);
