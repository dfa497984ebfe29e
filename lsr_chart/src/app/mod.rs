pub mod event;
pub mod reducer;
pub mod render;
pub mod state;

pub use event::*;
pub use state::*;

use crate::feed::{EventSink, Poller, PollerConfig, RepaintHook, SeriesSource};
use crate::model::{normalize_symbol, Period};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub period: Period,
    pub interval: Duration,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            period: Period::M5,
            interval: Duration::from_secs(5 * 60),
        }
    }
}

/// One live chart: its series state, the poller feeding it and the channel
/// in between. Dropping it stops the poller; late results hit a closed
/// channel and are dropped.
pub struct ChartRuntime {
    pub state: SeriesState,
    options: ChartOptions,
    source: Arc<dyn SeriesSource>,
    handle: Handle,
    tx: Sender<ChartEvent>,
    rx: Receiver<ChartEvent>,
    repaint: Option<RepaintHook>,
    poller: Option<Poller>,
    dirty: bool,
}

impl ChartRuntime {
    pub fn start(
        symbol: &str,
        options: ChartOptions,
        source: Arc<dyn SeriesSource>,
        handle: Handle,
        repaint: Option<RepaintHook>,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut runtime = Self {
            state: SeriesState::new(normalize_symbol(symbol), 1),
            options,
            source,
            handle,
            tx,
            rx,
            repaint,
            poller: None,
            dirty: true,
        };
        runtime.restart_poller();
        runtime
    }

    pub fn symbol(&self) -> &str {
        &self.state.symbol
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    /// Switch the chart to another symbol: samples are dropped and polling
    /// restarts under a new generation. Returns false for empty or unchanged input.
    pub fn set_symbol(&mut self, raw: &str) -> bool {
        let symbol = normalize_symbol(raw);
        if symbol.is_empty() || symbol == self.state.symbol {
            return false;
        }
        let generation = self.state.generation + 1;
        self.state.reset_for(symbol, generation);
        self.restart_poller();
        self.dirty = true;
        true
    }

    pub fn handle_event(&mut self, ev: ChartEvent) {
        if reducer::reduce(&mut self.state, ev) {
            self.dirty = true;
        }
    }

    /// Drain everything the poller has delivered so far.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok(ev) = self.rx.try_recv() {
            changed |= reducer::reduce(&mut self.state, ev);
        }
        if changed {
            self.dirty = true;
        }
        changed
    }

    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(Poller::is_running)
    }

    pub fn fetches_issued(&self) -> u64 {
        self.poller.as_ref().map(Poller::issued).unwrap_or(0)
    }

    pub fn stop(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }
    }

    fn restart_poller(&mut self) {
        // exactly one timer per chart
        self.stop();

        let config = PollerConfig {
            symbol: self.state.symbol.clone(),
            generation: self.state.generation,
            period: self.options.period,
            interval: self.options.interval,
        };
        let mut sink = EventSink::new(self.tx.clone());
        if let Some(hook) = &self.repaint {
            sink = sink.with_repaint(hook.clone());
        }
        self.poller = Some(Poller::start(&self.handle, config, self.source.clone(), sink));
    }
}

impl Drop for ChartRuntime {
    fn drop(&mut self) {
        self.stop();
    }
}
