use crate::error::FetchError;
use crate::model::{Period, Sample};
use async_trait::async_trait;

/// Anything that can produce a long/short ratio series for a symbol.
///
/// Implementations return samples in ascending timestamp order with unique
/// timestamps.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    async fn fetch_series(&self, symbol: &str, period: Period) -> Result<Vec<Sample>, FetchError>;

    /// Short label for logs and the window title.
    fn name(&self) -> &str;
}
