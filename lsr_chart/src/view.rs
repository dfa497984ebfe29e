//! Presentation values derived from a [`SeriesState`]. Pure functions only:
//! nothing here fetches or mutates state.

use crate::app::state::SeriesState;
use crate::model::Sample;
use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;

/// Stroke category of a series, decided by its most recent ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendColor {
    Neutral,
    Bullish,
    Bearish,
}

impl TrendColor {
    pub fn token(self) -> &'static str {
        match self {
            TrendColor::Neutral => "neutral",
            TrendColor::Bullish => "bullish",
            TrendColor::Bearish => "bearish",
        }
    }

    pub fn rgb(self) -> [u8; 3] {
        match self {
            TrendColor::Neutral => [128, 128, 128],
            TrendColor::Bullish => [0, 160, 0],
            TrendColor::Bearish => [210, 40, 40],
        }
    }
}

/// "bullish" above 1.0, "bearish" at or below, "neutral" without data.
pub fn trend_color(samples: &[Sample]) -> TrendColor {
    match samples.last() {
        None => TrendColor::Neutral,
        Some(last) if last.ratio > 1.0 => TrendColor::Bullish,
        Some(_) => TrendColor::Bearish,
    }
}

/// `HH:MM` in local time.
pub fn format_time_label(timestamp_ms: i64) -> String {
    format_time_label_in(timestamp_ms, &Local)
}

/// `HH:MM` in `tz`. Timestamps chrono cannot represent render as the epoch.
pub fn format_time_label_in<Tz>(timestamp_ms: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let utc: DateTime<Utc> = DateTime::from_timestamp_millis(timestamp_ms).unwrap_or_default();
    utc.with_timezone(tz).format("%H:%M").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineChartView {
    pub symbol: String,
    /// x = timestamp (ms), y = ratio
    pub points: Vec<[f64; 2]>,
    pub stroke: TrendColor,
    pub show_points: bool,
    pub last_ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesView {
    Loading { symbol: String },
    Chart(LineChartView),
}

pub fn build_view(state: &SeriesState) -> SeriesView {
    let Some(last) = state.last_sample() else {
        return SeriesView::Loading {
            symbol: state.symbol.clone(),
        };
    };
    if state.is_loading {
        return SeriesView::Loading {
            symbol: state.symbol.clone(),
        };
    }

    SeriesView::Chart(LineChartView {
        symbol: state.symbol.clone(),
        points: state
            .samples
            .iter()
            .map(|s| [s.timestamp_ms as f64, s.ratio])
            .collect(),
        stroke: trend_color(&state.samples),
        show_points: false,
        last_ratio: last.ratio,
    })
}
