use crate::export::{ExportMode, ExportOutcome};
use crate::model::{FetchTicket, Period, Sample};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const DEBUG_ENV: &str = "LSR_DEBUG_HOOKS";

static ENABLED: OnceLock<bool> = OnceLock::new();

fn hooks_enabled() -> bool {
    *ENABLED.get_or_init(|| {
        std::env::var(DEBUG_ENV)
            .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
            .unwrap_or(false)
    })
}

/// Install the fmt subscriber. `RUST_LOG` wins; otherwise `lsr_chart=info`,
/// or `lsr_chart=debug` when LSR_DEBUG_HOOKS is set.
pub fn init_logging() {
    let fallback = if hooks_enabled() {
        "lsr_chart=debug,lsr_watch=debug"
    } else {
        "lsr_chart=info,lsr_watch=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

pub fn log_poller_start(symbol: &str, generation: u64, period: Period, interval: Duration) {
    info!(
        target: "lsr_chart::feed::poller",
        "poller start symbol={symbol} gen={generation} period={period} every={}s",
        interval.as_secs()
    );
}

pub fn log_poller_stop(symbol: &str, generation: u64, issued: u64) {
    info!(
        target: "lsr_chart::feed::poller",
        "poller stop symbol={symbol} gen={generation} issued={issued}"
    );
}

pub fn log_fetch_start(ticket: &FetchTicket, period: Period) {
    debug!(
        target: "lsr_chart::feed::fetch",
        "fetch #{} symbol={} gen={} period={period}",
        ticket.seq, ticket.symbol, ticket.generation
    );
}

pub fn log_fetch_failed(ticket: &FetchTicket, err: &dyn std::fmt::Display) {
    warn!(
        target: "lsr_chart::feed::fetch",
        "fetch #{} symbol={} gen={} failed: {err}",
        ticket.seq, ticket.symbol, ticket.generation
    );
}

pub fn log_fetch_applied(ticket: &FetchTicket, samples: &[Sample]) {
    let last = samples
        .last()
        .map(|s| format!("{:.4}", s.ratio))
        .unwrap_or_else(|| "-".to_string());
    debug!(
        target: "lsr_chart::app::reducer",
        "apply #{} symbol={} samples={} last={last}",
        ticket.seq,
        ticket.symbol,
        samples.len()
    );
}

pub fn log_stale_discard(ticket: &FetchTicket, current_symbol: &str, what: &str) {
    debug!(
        target: "lsr_chart::app::reducer",
        "discard stale {what} #{} symbol={} gen={} (showing {current_symbol})",
        ticket.seq, ticket.symbol, ticket.generation
    );
}

pub fn log_sink_closed(ticket: &FetchTicket) {
    debug!(
        target: "lsr_chart::feed::poller",
        "chart gone; dropping result #{} for {}",
        ticket.seq, ticket.symbol
    );
}

pub fn log_export(symbol: &str, mode: ExportMode, outcome: &ExportOutcome) {
    match outcome {
        ExportOutcome::Failed(msg) => {
            warn!(target: "lsr_chart::export", "export {symbol} {mode:?} failed: {msg}")
        }
        other => info!(target: "lsr_chart::export", "export {symbol} {mode:?}: {other:?}"),
    }
}
