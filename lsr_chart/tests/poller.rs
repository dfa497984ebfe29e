mod common;

use common::{run_for, settle, ScriptedSource};
use lsr_chart::app::{ChartEvent, FeedEvent};
use lsr_chart::feed::{EventSink, Poller, PollerConfig};
use lsr_chart::model::Period;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

fn config(symbol: &str, every_secs: u64) -> PollerConfig {
    PollerConfig {
        symbol: symbol.to_string(),
        generation: 1,
        period: Period::M5,
        interval: Duration::from_secs(every_secs),
    }
}

fn start(source: &Arc<ScriptedSource>, every_secs: u64) -> (Poller, Receiver<ChartEvent>) {
    let (tx, rx) = mpsc::channel();
    let poller = Poller::start(
        &Handle::current(),
        config("BTCUSDT", every_secs),
        source.clone(),
        EventSink::new(tx),
    );
    (poller, rx)
}

#[tokio::test(start_paused = true)]
async fn fetches_immediately_then_every_interval() {
    let source = Arc::new(ScriptedSource::new(&[0]));
    let (mut poller, _rx) = start(&source, 100);

    settle().await;
    assert_eq!(source.calls(), 1);

    run_for(99).await;
    assert_eq!(source.calls(), 1);

    run_for(1).await;
    assert_eq!(source.calls(), 2);

    run_for(200).await;
    assert_eq!(source.calls(), 4);
    assert_eq!(poller.issued(), 4);

    poller.stop();
}

#[tokio::test(start_paused = true)]
async fn slow_responses_do_not_shift_the_schedule() {
    // every fetch outlives two periods
    let source = Arc::new(ScriptedSource::new(&[250]));
    let (mut poller, rx) = start(&source, 100);

    run_for(300).await;
    assert_eq!(source.calls(), 4);

    let completed: Vec<u64> = rx
        .try_iter()
        .filter_map(|ev| match ev {
            ChartEvent::Feed(FeedEvent::FetchCompleted { ticket, .. }) => Some(ticket.seq),
            _ => None,
        })
        .collect();
    assert_eq!(completed, vec![1]);

    poller.stop();
}

#[tokio::test(start_paused = true)]
async fn stop_issues_no_further_fetches() {
    let source = Arc::new(ScriptedSource::new(&[0]));
    let (mut poller, _rx) = start(&source, 100);

    run_for(150).await;
    assert_eq!(source.calls(), 2);

    poller.stop();
    run_for(1000).await;

    assert_eq!(source.calls(), 2);
    assert!(!poller.is_running());

    // idempotent
    poller.stop();
    assert_eq!(poller.issued(), 2);
}

#[tokio::test(start_paused = true)]
async fn drop_stops_the_timer() {
    let source = Arc::new(ScriptedSource::new(&[0]));
    let (poller, _rx) = start(&source, 100);

    settle().await;
    drop(poller);
    run_for(500).await;

    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn in_flight_fetch_finishes_after_stop() {
    let source = Arc::new(ScriptedSource::new(&[30]));
    let (mut poller, rx) = start(&source, 100);

    settle().await;
    poller.stop();
    run_for(40).await;

    let events: Vec<ChartEvent> = rx.try_iter().collect();
    assert!(matches!(
        events.as_slice(),
        [
            ChartEvent::Feed(FeedEvent::FetchStarted { .. }),
            ChartEvent::Feed(FeedEvent::FetchCompleted { .. })
        ]
    ));
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn failures_are_reported_as_events() {
    let source = Arc::new(ScriptedSource::new(&[0]).failing_on(&[1]));
    let (mut poller, rx) = start(&source, 100);

    settle().await;
    poller.stop();

    let failed = rx.try_iter().find_map(|ev| match ev {
        ChartEvent::Feed(FeedEvent::FetchFailed { ticket, error }) => Some((ticket.seq, error)),
        _ => None,
    });
    let (seq, error) = failed.expect("a failure event");
    assert_eq!(seq, 1);
    assert!(error.contains("503"), "{error}");
}

#[tokio::test(start_paused = true)]
async fn fetches_into_a_closed_channel_are_harmless() {
    let source = Arc::new(ScriptedSource::new(&[0]));
    let (mut poller, rx) = start(&source, 100);
    drop(rx);

    run_for(100).await;
    poller.stop();
    run_for(300).await;

    assert_eq!(source.calls(), 2);
}
