use crate::error::ParsePeriodError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// One observed point of a long/short ratio series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// epoch milliseconds
    pub timestamp_ms: i64,
    pub ratio: f64,
}

impl Sample {
    pub fn new(timestamp_ms: i64, ratio: f64) -> Self {
        Self { timestamp_ms, ratio }
    }
}

/// Bucket width of a ratio series, as accepted by the futures data endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    #[default]
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "1d")]
    D1,
}

impl Period {
    pub const ALL: [Period; 9] = [
        Period::M5,
        Period::M15,
        Period::M30,
        Period::H1,
        Period::H2,
        Period::H4,
        Period::H6,
        Period::H12,
        Period::D1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::M5 => "5m",
            Period::M15 => "15m",
            Period::M30 => "30m",
            Period::H1 => "1h",
            Period::H2 => "2h",
            Period::H4 => "4h",
            Period::H6 => "6h",
            Period::H12 => "12h",
            Period::D1 => "1d",
        }
    }

    pub fn duration(&self) -> Duration {
        let mins = match self {
            Period::M5 => 5,
            Period::M15 => 15,
            Period::M30 => 30,
            Period::H1 => 60,
            Period::H2 => 120,
            Period::H4 => 240,
            Period::H6 => 360,
            Period::H12 => 720,
            Period::D1 => 1440,
        };
        Duration::from_secs(mins * 60)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Period::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| ParsePeriodError(s.to_string()))
    }
}

/// Identity of one issued fetch. Results are only applied while the chart
/// still shows `symbol` under the same `generation`, and only if no fetch
/// with a higher `seq` has been applied already.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub symbol: String,
    pub generation: u64,
    pub seq: u64,
}

/// Normalize user-typed symbols ("btcusdt " -> "BTCUSDT").
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_parses_case_insensitive() {
        assert_eq!("5m".parse::<Period>(), Ok(Period::M5));
        assert_eq!(" 1H ".parse::<Period>(), Ok(Period::H1));
        assert!("7m".parse::<Period>().is_err());
    }

    #[test]
    fn period_serde_uses_api_names() {
        let json = serde_json::to_string(&Period::H12).unwrap();
        assert_eq!(json, "\"12h\"");
        let back: Period = serde_json::from_str("\"15m\"").unwrap();
        assert_eq!(back, Period::M15);
        assert_eq!(Period::M5.duration(), Duration::from_secs(300));
    }

    #[test]
    fn symbols_are_normalized() {
        assert_eq!(normalize_symbol("  ethusdt\n"), "ETHUSDT");
        assert_eq!(normalize_symbol(""), "");
    }
}
