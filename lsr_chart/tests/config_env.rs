use clap::Parser;
use lsr_chart::cli::CommonArgs;
use lsr_chart::model::Period;
use serial_test::serial;
use std::fs;
use std::path::PathBuf;

const VARS: [&str; 5] = ["LSR_SYMBOLS", "LSR_PERIOD", "LSR_REFRESH_SECS", "LSR_API_BASE_URL", "LSR_DUMMY"];

#[derive(Parser)]
struct TestCli {
    #[command(flatten)]
    common: CommonArgs,
}

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

fn config_file(name: &str, json: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lsr_chart_env_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");
    fs::write(&path, json).unwrap();
    path
}

#[test]
#[serial]
fn env_beats_file_and_flags_beat_env() {
    clear_env();
    let path = config_file("precedence", r#"{"symbols":["ADAUSDT"],"period":"1h","refresh_secs":600}"#);
    std::env::set_var("LSR_SYMBOLS", "xrpusdt");
    std::env::set_var("LSR_REFRESH_SECS", "120");

    let cli = TestCli::try_parse_from(["lsr", "--config", path.to_str().unwrap(), "--refresh-secs", "30"]).unwrap();
    let (cfg, store) = cli.common.load_config();
    clear_env();

    assert_eq!(store.config_path(), path.as_path());
    assert_eq!(cfg.symbols, vec!["XRPUSDT".to_string()]);
    assert_eq!(cfg.period, Period::H1);
    assert_eq!(cfg.refresh_secs, 30);
}

#[test]
#[serial]
fn bad_env_values_fall_back_to_file() {
    clear_env();
    let path = config_file("bad_env", r#"{"period":"4h"}"#);
    std::env::set_var("LSR_PERIOD", "weekly");
    std::env::set_var("LSR_DUMMY", "false");

    let cli = TestCli::try_parse_from(["lsr", "--config", path.to_str().unwrap()]).unwrap();
    let (cfg, _) = cli.common.load_config();
    clear_env();

    assert_eq!(cfg.period, Period::H4);
    assert!(!cfg.use_dummy_feed);
}
