use super::source::SeriesSource;
use crate::error::FetchError;
use crate::model::{Period, Sample};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://fapi.binance.com";
pub const MAX_LIMIT: u32 = 500;
const RATIO_PATH: &str = "/futures/data/globalLongShortAccountRatio";

/// Account long/short ratio from the USDⓈ-M futures data API.
pub struct BinanceRatioSource {
    base_url: String,
    limit: u32,
    client: reqwest::Client,
}

impl BinanceRatioSource {
    pub fn new(base_url: &str, limit: u32, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(FetchError::Config(format!(
                "base url must start with http:// or https://, got {base_url:?}"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lsr_chart/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url,
            limit: limit.clamp(1, MAX_LIMIT),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[async_trait]
impl SeriesSource for BinanceRatioSource {
    async fn fetch_series(&self, symbol: &str, period: Period) -> Result<Vec<Sample>, FetchError> {
        let url = format!("{}{}", self.base_url, RATIO_PATH);
        let limit = self.limit.to_string();
        debug!("GET {url} symbol={symbol} period={period} limit={limit}");

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol), ("period", period.as_str()), ("limit", limit.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), body));
        }

        decode_rows(&body)
    }

    fn name(&self) -> &str {
        "binance"
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

fn api_error(status: u16, body: String) -> FetchError {
    match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(err) => FetchError::Api {
            code: err.code,
            msg: err.msg,
        },
        Err(_) => FetchError::Status { status, body },
    }
}

/// Numbers arrive as JSON numbers or as strings depending on the endpoint.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flex {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Flex {
    fn as_i64(&self) -> Option<i64> {
        match self {
            Flex::Int(v) => Some(*v),
            Flex::Float(v) if v.is_finite() => Some(*v as i64),
            Flex::Float(_) => None,
            Flex::Text(s) => s.trim().parse().ok(),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Flex::Int(v) => Some(*v as f64),
            Flex::Float(v) => Some(*v),
            Flex::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RatioRow {
    long_short_ratio: Flex,
    timestamp: Flex,
}

/// Decode a ratio response body into an ascending, timestamp-unique series.
/// Rows sharing a timestamp collapse to the last one received.
pub fn decode_rows(body: &str) -> Result<Vec<Sample>, FetchError> {
    let rows: Vec<RatioRow> = serde_json::from_str(body)?;

    let mut samples = Vec::with_capacity(rows.len());
    for row in rows {
        let timestamp_ms = row
            .timestamp
            .as_i64()
            .ok_or_else(|| FetchError::Decode(format!("bad timestamp {:?}", row.timestamp)))?;
        let ratio = row
            .long_short_ratio
            .as_f64()
            .ok_or_else(|| FetchError::Decode(format!("bad ratio {:?}", row.long_short_ratio)))?;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(FetchError::InvalidSample {
                timestamp_ms,
                ratio,
            });
        }
        samples.push(Sample::new(timestamp_ms, ratio));
    }

    // stable, so the last duplicate stays last
    samples.sort_by_key(|s| s.timestamp_ms);
    let mut out: Vec<Sample> = Vec::with_capacity(samples.len());
    for s in samples {
        match out.last_mut() {
            Some(prev) if prev.timestamp_ms == s.timestamp_ms => *prev = s,
            _ => out.push(s),
        }
    }
    Ok(out)
}
