use super::source::SeriesSource;
use crate::app::event::{ChartEvent, FeedEvent};
use crate::debug_hooks;
use crate::model::{FetchTicket, Period};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Called after every event so an idle UI wakes up and drains the channel.
pub type RepaintHook = Arc<dyn Fn() + Send + Sync>;

/// Where fetch events go: the owning chart's channel.
#[derive(Clone)]
pub struct EventSink {
    tx: Sender<ChartEvent>,
    repaint: Option<RepaintHook>,
}

impl EventSink {
    pub fn new(tx: Sender<ChartEvent>) -> Self {
        Self { tx, repaint: None }
    }

    pub fn with_repaint(mut self, hook: RepaintHook) -> Self {
        self.repaint = Some(hook);
        self
    }

    /// Returns false once the receiving chart is gone.
    pub fn emit(&self, ev: ChartEvent) -> bool {
        if self.tx.send(ev).is_err() {
            return false;
        }
        if let Some(repaint) = &self.repaint {
            repaint();
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub symbol: String,
    pub generation: u64,
    pub period: Period,
    pub interval: Duration,
}

/// Fixed-period fetch loop for one symbol.
///
/// Fetches once right away and then on every multiple of `interval`. Each
/// fetch runs as its own task, so a slow response never shifts the schedule.
/// `stop` (or drop) cancels the timer; fetches already in flight finish and
/// their results are left to the chart's ticket check.
pub struct Poller {
    config: PollerConfig,
    timer: Option<JoinHandle<()>>,
    stopped: Arc<AtomicBool>,
    issued: Arc<AtomicU64>,
}

impl Poller {
    pub fn start(
        handle: &Handle,
        config: PollerConfig,
        source: Arc<dyn SeriesSource>,
        sink: EventSink,
    ) -> Self {
        debug_hooks::log_poller_start(&config.symbol, config.generation, config.period, config.interval);

        let stopped = Arc::new(AtomicBool::new(false));
        let issued = Arc::new(AtomicU64::new(0));
        let timer = handle.spawn(run_timer(
            config.clone(),
            source,
            sink,
            stopped.clone(),
            issued.clone(),
        ));

        Self {
            config,
            timer: Some(timer),
            stopped,
            issued,
        }
    }

    pub fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(timer) = self.timer.take() {
            timer.abort();
            debug_hooks::log_poller_stop(&self.config.symbol, self.config.generation, self.issued());
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Number of fetches issued so far.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_timer(
    config: PollerConfig,
    source: Arc<dyn SeriesSource>,
    sink: EventSink,
    stopped: Arc<AtomicBool>,
    issued: Arc<AtomicU64>,
) {
    let mut ticker = tokio::time::interval(config.interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        // first tick completes immediately
        ticker.tick().await;
        if stopped.load(Ordering::SeqCst) {
            break;
        }

        let seq = issued.fetch_add(1, Ordering::SeqCst) + 1;
        let ticket = FetchTicket {
            symbol: config.symbol.clone(),
            generation: config.generation,
            seq,
        };
        tokio::spawn(fetch_once(ticket, config.period, source.clone(), sink.clone()));
    }
}

async fn fetch_once(ticket: FetchTicket, period: Period, source: Arc<dyn SeriesSource>, sink: EventSink) {
    debug_hooks::log_fetch_start(&ticket, period);
    if !sink.emit(ChartEvent::Feed(FeedEvent::FetchStarted {
        ticket: ticket.clone(),
    })) {
        debug_hooks::log_sink_closed(&ticket);
        return;
    }

    let ev = match source.fetch_series(&ticket.symbol, period).await {
        Ok(samples) => FeedEvent::FetchCompleted {
            ticket: ticket.clone(),
            samples,
        },
        Err(err) => {
            debug_hooks::log_fetch_failed(&ticket, &err);
            FeedEvent::FetchFailed {
                ticket: ticket.clone(),
                error: err.to_string(),
            }
        }
    };

    if !sink.emit(ChartEvent::Feed(ev)) {
        debug_hooks::log_sink_closed(&ticket);
    }
}
