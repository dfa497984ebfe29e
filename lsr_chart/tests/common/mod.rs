#![allow(dead_code)]

use async_trait::async_trait;
use lsr_chart::error::FetchError;
use lsr_chart::feed::SeriesSource;
use lsr_chart::model::{Period, Sample};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Call `n` (1-based) sleeps `latencies[n-1]` (the last entry repeats) and
/// returns one sample `(n * 1000, 1.0 + n / 10)`, or fails if `n` is listed
/// in `fail_calls`.
pub struct ScriptedSource {
    latencies: Vec<Duration>,
    fail_calls: Vec<u64>,
    calls: AtomicU64,
    symbols: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new(latencies: &[u64]) -> Self {
        Self {
            latencies: latencies.iter().map(|s| Duration::from_secs(*s)).collect(),
            fail_calls: Vec::new(),
            calls: AtomicU64::new(0),
            symbols: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, calls: &[u64]) -> Self {
        self.fail_calls = calls.to_vec();
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn symbols(&self) -> Vec<String> {
        self.symbols.lock().unwrap().clone()
    }

    pub fn ratio_of_call(n: u64) -> f64 {
        1.0 + n as f64 / 10.0
    }
}

#[async_trait]
impl SeriesSource for ScriptedSource {
    async fn fetch_series(&self, symbol: &str, _period: Period) -> Result<Vec<Sample>, FetchError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.symbols.lock().unwrap().push(symbol.to_string());

        let idx = (n as usize - 1).min(self.latencies.len().saturating_sub(1));
        let latency = self.latencies.get(idx).copied().unwrap_or_default();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.fail_calls.contains(&n) {
            return Err(FetchError::Status {
                status: 503,
                body: format!("scripted failure #{n}"),
            });
        }
        Ok(vec![Sample::new(n as i64 * 1000, Self::ratio_of_call(n))])
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Let spawned tasks run without moving the paused clock.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Move the paused clock forward one second at a time.
pub async fn run_for(secs: u64) {
    settle().await;
    for _ in 0..secs {
        tokio::time::advance(Duration::from_secs(1)).await;
        settle().await;
    }
}

/// Always answers with the same samples.
pub struct FixedSource(pub Vec<Sample>);

#[async_trait]
impl SeriesSource for FixedSource {
    async fn fetch_series(&self, _symbol: &str, _period: Period) -> Result<Vec<Sample>, FetchError> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
