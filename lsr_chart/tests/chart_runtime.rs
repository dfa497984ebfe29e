mod common;

use chrono::Utc;
use common::{run_for, settle, FixedSource, ScriptedSource};
use lsr_chart::app::{ChartEvent, ChartOptions, ChartRuntime, UiEvent};
use lsr_chart::model::{Period, Sample};
use lsr_chart::view::{build_view, format_time_label, format_time_label_in, trend_color, SeriesView, TrendColor};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

fn options(every_secs: u64) -> ChartOptions {
    ChartOptions {
        period: Period::M5,
        interval: Duration::from_secs(every_secs),
    }
}

fn start(symbol: &str, source: &Arc<ScriptedSource>, every_secs: u64) -> ChartRuntime {
    ChartRuntime::start(symbol, options(every_secs), source.clone(), Handle::current(), None)
}

fn ratios(chart: &ChartRuntime) -> Vec<f64> {
    chart.state.samples.iter().map(|s| s.ratio).collect()
}

#[tokio::test(start_paused = true)]
async fn btcusdt_loads_and_renders_a_line() {
    let source = Arc::new(ScriptedSource::new(&[2]));
    let mut chart = start("btcusdt", &source, 300);

    assert_eq!(chart.symbol(), "BTCUSDT");
    assert!(chart.state.is_loading);
    assert!(matches!(build_view(&chart.state), SeriesView::Loading { .. }));

    run_for(3).await;
    assert!(chart.pump());

    assert!(!chart.state.is_loading);
    assert_eq!(ratios(&chart), vec![ScriptedSource::ratio_of_call(1)]);
    assert_eq!(source.symbols(), vec!["BTCUSDT".to_string()]);

    let SeriesView::Chart(view) = build_view(&chart.state) else {
        panic!("expected a chart");
    };
    assert_eq!(view.stroke, TrendColor::Bullish);
    assert_eq!(trend_color(&chart.state.samples), TrendColor::Bullish);
    assert!(!view.show_points);
    assert_eq!(format_time_label(view.points[0][0] as i64).len(), 5);

    chart.stop();
}

#[tokio::test(start_paused = true)]
async fn five_minute_btcusdt_series_turns_bullish() {
    let source = Arc::new(FixedSource(vec![Sample::new(1000, 0.8), Sample::new(2000, 1.3)]));
    let mut chart = ChartRuntime::start("BTCUSDT", options(300), source, Handle::current(), None);

    settle().await;
    chart.pump();

    assert_eq!(trend_color(&chart.state.samples[..1]), TrendColor::Bearish);
    assert_eq!(trend_color(&chart.state.samples), TrendColor::Bullish);
    assert_eq!(format_time_label_in(1000, &Utc), "00:00");
    assert_eq!(chart.fetches_issued(), 1);

    run_for(300).await;
    assert_eq!(chart.fetches_issued(), 2);

    chart.stop();
}

#[tokio::test(start_paused = true)]
async fn switching_symbol_discards_the_old_in_flight_result() {
    // BTC is slow, ETH answers quickly
    let source = Arc::new(ScriptedSource::new(&[10, 1]));
    let mut chart = start("BTCUSDT", &source, 300);
    settle().await;

    assert!(chart.set_symbol("ethusdt"));
    assert_eq!(chart.symbol(), "ETHUSDT");
    assert!(chart.state.samples.is_empty());
    assert!(chart.state.is_loading);

    run_for(2).await;
    chart.pump();
    assert_eq!(ratios(&chart), vec![ScriptedSource::ratio_of_call(2)]);

    run_for(10).await;
    chart.pump();

    // BTC completion arrived after the switch and was ignored
    assert_eq!(chart.symbol(), "ETHUSDT");
    assert_eq!(ratios(&chart), vec![ScriptedSource::ratio_of_call(2)]);
    assert_eq!(chart.state.last_applied_seq, 1);
    assert_eq!(source.symbols(), vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]);

    chart.stop();
}

#[tokio::test(start_paused = true)]
async fn symbol_switch_leaves_exactly_one_timer() {
    let source = Arc::new(ScriptedSource::new(&[0]));
    let mut chart = start("BTCUSDT", &source, 100);

    run_for(50).await;
    assert!(chart.set_symbol("ETHUSDT"));

    // new timer fires at 50, 150, 250; the old one would have fired at 100 and 200
    run_for(250).await;

    assert_eq!(
        source.symbols(),
        vec![
            "BTCUSDT".to_string(),
            "ETHUSDT".to_string(),
            "ETHUSDT".to_string(),
            "ETHUSDT".to_string(),
        ]
    );
    assert_eq!(chart.fetches_issued(), 3);

    chart.pump();
    assert_eq!(chart.state.last_applied_seq, 3);

    chart.stop();
}

#[tokio::test(start_paused = true)]
async fn older_overlapping_completion_never_overwrites_newer_data() {
    // #1: 0 -> 250, #2: 100 -> 110, #3: 200 -> 210
    let source = Arc::new(ScriptedSource::new(&[250, 10]));
    let mut chart = start("BTCUSDT", &source, 100);

    run_for(110).await;
    chart.pump();
    assert_eq!(chart.state.last_applied_seq, 2);

    run_for(100).await;
    chart.pump();
    assert_eq!(chart.state.last_applied_seq, 3);

    run_for(45).await;
    chart.pump();
    assert_eq!(chart.state.last_applied_seq, 3);
    assert_eq!(ratios(&chart), vec![ScriptedSource::ratio_of_call(3)]);

    chart.stop();
}

#[tokio::test(start_paused = true)]
async fn failure_keeps_previous_samples_and_shows_error() {
    let source = Arc::new(ScriptedSource::new(&[0]).failing_on(&[2]));
    let mut chart = start("BTCUSDT", &source, 60);

    settle().await;
    chart.pump();
    let before = ratios(&chart);
    assert_eq!(before.len(), 1);

    run_for(60).await;
    chart.pump();

    assert_eq!(ratios(&chart), before);
    assert!(!chart.state.is_loading);
    let err = chart.state.last_error.clone().expect("error banner");
    assert!(err.message.contains("scripted failure"), "{}", err.message);

    chart.handle_event(ChartEvent::Ui(UiEvent::DismissError));
    assert!(chart.state.last_error.is_none());

    // next success clears it anyway
    run_for(60).await;
    chart.pump();
    assert_eq!(ratios(&chart), vec![ScriptedSource::ratio_of_call(3)]);

    chart.stop();
}

#[tokio::test(start_paused = true)]
async fn stop_and_drop_end_polling() {
    let source = Arc::new(ScriptedSource::new(&[0]));
    let mut chart = start("BTCUSDT", &source, 50);
    run_for(50).await;
    assert_eq!(chart.fetches_issued(), 2);

    chart.stop();
    run_for(200).await;
    assert!(!chart.is_polling());
    assert_eq!(source.calls(), 2);

    let other = start("ETHUSDT", &source, 50);
    settle().await;
    drop(other);
    run_for(200).await;
    assert_eq!(source.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn unchanged_or_empty_symbol_is_ignored() {
    let source = Arc::new(ScriptedSource::new(&[0]));
    let mut chart = start("BTCUSDT", &source, 300);
    settle().await;
    chart.pump();
    let generation = chart.state.generation;

    assert!(!chart.set_symbol(" btcusdt "));
    assert!(!chart.set_symbol("   "));
    assert_eq!(chart.state.generation, generation);
    assert_eq!(source.calls(), 1);

    chart.stop();
}
