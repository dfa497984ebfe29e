//! Command-line flags shared by `lsr_chart` and `lsr_watch`.

use crate::app::ChartOptions;
use crate::error::FetchError;
use crate::feed::{BinanceRatioSource, DummySource, SeriesSource};
use crate::model::Period;
use crate::persist::{split_symbols, AppConfig, Persistence};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Symbols to chart, comma separated (e.g. BTCUSDT,ETHUSDT)
    #[arg(long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Ratio period: 5m, 15m, 30m, 1h, 2h, 4h, 6h, 12h or 1d
    #[arg(long)]
    pub period: Option<Period>,

    /// Seconds between refreshes (minimum 5)
    #[arg(long)]
    pub refresh_secs: Option<u64>,

    #[arg(long)]
    pub api_base_url: Option<String>,

    /// Use the offline generator instead of the exchange API
    #[arg(long)]
    pub dummy: bool,

    /// Config file (defaults to the per-user config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Where "Save PNG" writes files
    #[arg(long)]
    pub download_dir: Option<PathBuf>,
}

impl CommonArgs {
    /// defaults < config file < LSR_* env < flags
    pub fn load_config(&self) -> (AppConfig, Persistence) {
        let store = match &self.config {
            Some(path) => Persistence::at(path.clone()),
            None => Persistence::new(),
        };
        let mut cfg = store.load();
        cfg.apply_env();
        self.apply(&mut cfg);
        (cfg.normalized(), store)
    }

    pub fn apply(&self, cfg: &mut AppConfig) {
        if !self.symbols.is_empty() {
            cfg.symbols = self.symbols.iter().flat_map(|s| split_symbols(s)).collect();
        }
        if let Some(period) = self.period {
            cfg.period = period;
        }
        if let Some(secs) = self.refresh_secs {
            cfg.refresh_secs = secs;
        }
        if let Some(url) = &self.api_base_url {
            cfg.api_base_url = url.clone();
        }
        if self.dummy {
            cfg.use_dummy_feed = true;
        }
        if let Some(dir) = &self.download_dir {
            cfg.download_dir = Some(dir.clone());
        }
    }
}

pub fn build_source(cfg: &AppConfig) -> Result<Arc<dyn SeriesSource>, FetchError> {
    if cfg.use_dummy_feed {
        return Ok(Arc::new(DummySource::new(cfg.limit)));
    }
    let source = BinanceRatioSource::new(&cfg.api_base_url, cfg.limit, cfg.request_timeout())?;
    Ok(Arc::new(source))
}

pub fn chart_options(cfg: &AppConfig) -> ChartOptions {
    ChartOptions {
        period: cfg.period,
        interval: cfg.refresh_interval(),
    }
}
