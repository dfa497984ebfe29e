// lsr_chart/src/bin/lsr_watch.rs
//
// Headless poller: same feed and state machine as the GUI, results go to the log.

use anyhow::{Context as _, Result};
use clap::Parser;
use lsr_chart::app::{ChartRuntime, SeriesState};
use lsr_chart::cli::{build_source, chart_options, CommonArgs};
use lsr_chart::debug_hooks;
use lsr_chart::model::Sample;
use lsr_chart::view::{format_time_label, trend_color};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "lsr_watch", about = "Log long/short ratios without a window")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Fetch each symbol once and exit
    #[arg(long)]
    once: bool,
}

struct Watched {
    runtime: ChartRuntime,
    reported_seq: u64,
    reported_error_at: Option<i64>,
}

fn summary(symbol: &str, samples: &[Sample]) -> String {
    match samples.last() {
        Some(last) => format!(
            "{symbol} n={} last={:.4} {} @ {}",
            samples.len(),
            last.ratio,
            trend_color(samples).token(),
            format_time_label(last.timestamp_ms)
        ),
        None => format!("{symbol} n=0"),
    }
}

fn report(w: &mut Watched) {
    let state: &SeriesState = &w.runtime.state;

    if state.last_applied_seq != w.reported_seq {
        w.reported_seq = state.last_applied_seq;
        info!("{}", summary(&state.symbol, &state.samples));
    }

    let error_at = state.last_error.as_ref().map(|e| e.at_ms);
    if error_at != w.reported_error_at {
        w.reported_error_at = error_at;
        if let Some(err) = &state.last_error {
            warn!("{} refresh failed: {}", state.symbol, err.message);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    debug_hooks::init_logging();

    let cli = Cli::parse();
    let (cfg, _store) = cli.common.load_config();
    let source = build_source(&cfg).context("data source")?;

    if cfg.symbols.is_empty() {
        warn!("no symbols configured; nothing to do");
        return Ok(());
    }

    if cli.once {
        for symbol in &cfg.symbols {
            match source.fetch_series(symbol, cfg.period).await {
                Ok(samples) => info!("{}", summary(symbol, &samples)),
                Err(err) => warn!("{symbol} fetch failed: {err}"),
            }
        }
        return Ok(());
    }

    info!(
        "watching {:?} via {} period={} every {}s; ctrl-c to stop",
        cfg.symbols,
        source.name(),
        cfg.period,
        cfg.refresh_secs
    );

    let options = chart_options(&cfg);
    let mut watched: Vec<Watched> = cfg
        .symbols
        .iter()
        .map(|symbol| Watched {
            runtime: ChartRuntime::start(symbol, options.clone(), source.clone(), Handle::current(), None),
            reported_seq: 0,
            reported_error_at: None,
        })
        .collect();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut drain = tokio::time::interval(Duration::from_millis(250));

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                if let Err(err) = res {
                    warn!("ctrl-c handler failed: {err}");
                }
                info!("stopping");
                break;
            }
            _ = drain.tick() => {
                for w in &mut watched {
                    w.runtime.pump();
                    if w.runtime.take_dirty() {
                        report(w);
                    }
                }
            }
        }
    }

    for w in &mut watched {
        w.runtime.stop();
    }
    Ok(())
}
