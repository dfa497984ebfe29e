use super::source::SeriesSource;
use crate::app::state::now_ms;
use crate::error::FetchError;
use crate::model::{Period, Sample};
use async_trait::async_trait;
use std::time::Duration;

/// Offline source: a deterministic wobble around 1.0, one sample per bucket,
/// ending at the current bucket. Same symbol + bucket always yields the same ratio.
pub struct DummySource {
    limit: u32,
    latency: Duration,
}

impl DummySource {
    pub fn new(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            latency: Duration::ZERO,
        }
    }

    /// Pretend the network is slow.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn series_at(&self, symbol: &str, period: Period, now_ms: i64) -> Vec<Sample> {
        let step = period.duration().as_millis() as i64;
        let last_bucket = now_ms.div_euclid(step);
        let seed: i64 = symbol.bytes().map(i64::from).sum();

        (0..self.limit as i64)
            .rev()
            .map(|back| {
                let n = last_bucket - back;
                Sample::new(n * step, ratio_for(n, seed))
            })
            .collect()
    }
}

fn ratio_for(bucket: i64, seed: i64) -> f64 {
    let phase = (bucket + seed) as f64 * 0.37;
    let jitter = ((bucket * 7 + seed).rem_euclid(11)) as f64 / 11.0;
    1.0 + 0.3 * phase.sin() + 0.05 * jitter - 0.025
}

#[async_trait]
impl SeriesSource for DummySource {
    async fn fetch_series(&self, symbol: &str, period: Period) -> Result<Vec<Sample>, FetchError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.series_at(symbol, period, now_ms()))
    }

    fn name(&self) -> &str {
        "dummy"
    }
}
