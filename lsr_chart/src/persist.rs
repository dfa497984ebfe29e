// lsr_chart/src/persist.rs

use crate::feed::binance::{DEFAULT_BASE_URL, MAX_LIMIT};
use crate::model::{normalize_symbol, Period};
use anyhow::{Context, Result};
use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tracing::warn;

/// Bump when you change config schema.
const CONFIG_VERSION: u32 = 1;
const MIN_REFRESH_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub version: u32,

    // charts
    pub symbols: Vec<String>,
    pub period: Period,
    pub refresh_secs: u64,

    // data source
    pub limit: u32,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub use_dummy_feed: bool,

    // export
    pub download_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,

            symbols: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
            period: Period::M5,
            refresh_secs: 5 * 60,

            limit: 30,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 15,
            use_dummy_feed: false,

            download_dir: None,
        }
    }
}

impl AppConfig {
    /// Overlay `LSR_*` environment variables. Unparsable values are logged and ignored.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get("LSR_SYMBOLS") {
            self.symbols = split_symbols(&v);
        }
        if let Some(v) = get("LSR_PERIOD") {
            match v.parse::<Period>() {
                Ok(p) => self.period = p,
                Err(err) => warn!("ignoring LSR_PERIOD: {err}"),
            }
        }
        if let Some(v) = get("LSR_REFRESH_SECS") {
            match v.trim().parse::<u64>() {
                Ok(n) => self.refresh_secs = n,
                Err(err) => warn!("ignoring LSR_REFRESH_SECS={v:?}: {err}"),
            }
        }
        if let Some(v) = get("LSR_API_BASE_URL") {
            self.api_base_url = v.trim().to_string();
        }
        if let Some(v) = get("LSR_DUMMY") {
            self.use_dummy_feed = v != "0" && !v.eq_ignore_ascii_case("false");
        }
    }

    /// Clamp everything into the ranges the rest of the app assumes.
    pub fn normalized(mut self) -> Self {
        let mut symbols: Vec<String> = Vec::with_capacity(self.symbols.len());
        for s in self.symbols.iter().map(|s| normalize_symbol(s)) {
            if !s.is_empty() && !symbols.contains(&s) {
                symbols.push(s);
            }
        }
        self.symbols = symbols;
        self.refresh_secs = self.refresh_secs.max(MIN_REFRESH_SECS);
        self.limit = self.limit.clamp(1, MAX_LIMIT);
        self.request_timeout_secs = self.request_timeout_secs.max(1);
        if self.api_base_url.trim().is_empty() {
            self.api_base_url = DEFAULT_BASE_URL.to_string();
        }
        self
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured dir, else the user's download dir, else the working dir.
    pub fn resolved_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(|| UserDirs::new().and_then(|d| d.download_dir().map(Path::to_path_buf)))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// "btcusdt, ethusdt" -> ["BTCUSDT", "ETHUSDT"]
pub fn split_symbols(raw: &str) -> Vec<String> {
    raw.split([',', ' '])
        .map(normalize_symbol)
        .filter(|s| !s.is_empty())
        .collect()
}

struct Inner {
    path: PathBuf,
    last_saved_json: Mutex<String>,
}

#[derive(Clone)]
pub struct Persistence {
    inner: Arc<Inner>,
}

impl Persistence {
    pub fn new() -> Self {
        Self::at(default_config_path())
    }

    pub fn at(path: PathBuf) -> Self {
        Self {
            inner: Arc::new(Inner {
                path,
                last_saved_json: Mutex::new(String::new()),
            }),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.inner.path
    }

    /// Missing file -> defaults. Corrupt file -> archived, defaults.
    pub fn load(&self) -> AppConfig {
        let path = &self.inner.path;
        if !path.exists() {
            return AppConfig::default();
        }
        match read_json::<AppConfig>(path) {
            Ok(mut cfg) => {
                // simple migration hook
                if cfg.version == 0 {
                    cfg.version = CONFIG_VERSION;
                }
                cfg
            }
            Err(err) => {
                archive_corrupt(path, &err);
                AppConfig::default()
            }
        }
    }

    /// Save if content changed (prevents hammering disk)
    pub fn save_now(&self, cfg: &AppConfig) -> Result<()> {
        let path = &self.inner.path;

        let parent = path.parent().context("config path has no parent")?;
        fs::create_dir_all(parent).with_context(|| format!("create config dir {:?}", parent))?;

        let json = serde_json::to_string_pretty(cfg)?;

        {
            let mut last = self
                .inner
                .last_saved_json
                .lock()
                .map_err(|_| anyhow::anyhow!("config save lock poisoned"))?;
            if *last == json {
                return Ok(());
            }
            *last = json.clone();
        }

        atomic_write(path, json.as_bytes())?;
        Ok(())
    }
}

impl Default for Persistence {
    fn default() -> Self {
        Self::new()
    }
}

fn default_config_path() -> PathBuf {
    ProjectDirs::from("com", "lsr", "lsr_chart")
        .map(|proj| proj.config_dir().join("config.json"))
        .unwrap_or_else(|| PathBuf::from("data").join("config.json"))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("read {:?}", path))?;
    let value = serde_json::from_slice::<T>(&bytes).with_context(|| "parse json")?;
    Ok(value)
}

fn archive_corrupt(path: &Path, err: &anyhow::Error) {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let archived = path.with_extension(format!("corrupt.{ts}.json"));
    let _ = fs::rename(path, &archived);
    warn!("config corrupt; archived to {:?}. error: {err:?}", archived);
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().context("no parent dir for config path")?;
    let tmp = dir.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    {
        let mut f = fs::File::create(&tmp).with_context(|| format!("create tmp {:?}", tmp))?;
        f.write_all(bytes).with_context(|| "write tmp")?;
        let _ = f.sync_all();
    }

    fs::rename(&tmp, path).with_context(|| format!("rename {:?} -> {:?}", tmp, path))?;
    Ok(())
}
