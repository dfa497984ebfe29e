use super::event::*;
use super::state::*;
use crate::debug_hooks;

/// Apply one event to the series state. Returns true if anything visible changed.
pub fn reduce(state: &mut SeriesState, ev: ChartEvent) -> bool {
    match ev {
        ChartEvent::Feed(f) => reduce_feed(state, f),
        ChartEvent::Ui(u) => reduce_ui(state, u),
    }
}

fn reduce_feed(state: &mut SeriesState, ev: FeedEvent) -> bool {
    match ev {
        FeedEvent::FetchStarted { ticket } => {
            // only fetches newer than the applied result may raise the flag
            if !state.is_fresh(&ticket) {
                debug_hooks::log_stale_discard(&ticket, &state.symbol, "start");
                return false;
            }
            if state.is_loading {
                return false;
            }
            state.is_loading = true;
            true
        }
        FeedEvent::FetchCompleted { ticket, samples } => {
            if !state.is_fresh(&ticket) {
                debug_hooks::log_stale_discard(&ticket, &state.symbol, "completed");
                return false;
            }
            debug_hooks::log_fetch_applied(&ticket, &samples);

            state.samples = samples.into();
            state.last_applied_seq = ticket.seq;
            state.is_loading = false;
            state.last_error = None;
            state.last_updated_ms = Some(now_ms());
            true
        }
        FeedEvent::FetchFailed { ticket, error } => {
            if !state.is_fresh(&ticket) {
                debug_hooks::log_stale_discard(&ticket, &state.symbol, "failed");
                return false;
            }
            // samples are kept; last_applied_seq stays so an older in-flight
            // success can still land.
            state.is_loading = false;
            state.last_error = Some(FetchFailure {
                message: error,
                at_ms: now_ms(),
            });
            true
        }
    }
}

fn reduce_ui(state: &mut SeriesState, ev: UiEvent) -> bool {
    match ev {
        UiEvent::ChartPainted { symbol } => {
            if symbol != state.symbol || !state.is_loading {
                return false;
            }
            state.is_loading = false;
            true
        }
        UiEvent::DismissError => state.last_error.take().is_some(),
    }
}
