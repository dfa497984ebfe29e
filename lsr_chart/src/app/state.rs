use crate::model::{FetchTicket, Sample};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub message: String,
    pub at_ms: i64,
}

/// Everything one chart instance knows about its series.
#[derive(Debug, Clone)]
pub struct SeriesState {
    pub symbol: String,
    /// Replaced wholesale on every applied fetch.
    pub samples: Arc<[Sample]>,
    pub is_loading: bool,

    // stale-result guard
    pub generation: u64,
    pub last_applied_seq: u64,

    pub last_error: Option<FetchFailure>,
    pub last_updated_ms: Option<i64>,
}

impl SeriesState {
    pub fn new(symbol: impl Into<String>, generation: u64) -> Self {
        Self {
            symbol: symbol.into(),
            samples: Arc::from(Vec::new()),
            is_loading: true,
            generation,
            last_applied_seq: 0,
            last_error: None,
            last_updated_ms: None,
        }
    }

    /// Switch to another symbol (or restart the same one) under a new poller
    /// generation. Nothing from the previous series survives.
    pub fn reset_for(&mut self, symbol: impl Into<String>, generation: u64) {
        *self = Self::new(symbol, generation);
    }

    /// Ticket was issued for what this state currently shows.
    pub fn accepts(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation && ticket.symbol == self.symbol
    }

    /// Ticket is current and newer than anything applied so far.
    pub fn is_fresh(&self, ticket: &FetchTicket) -> bool {
        self.accepts(ticket) && ticket.seq > self.last_applied_seq
    }

    pub fn last_sample(&self) -> Option<&Sample> {
        self.samples.last()
    }
}

/// unix millis
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
