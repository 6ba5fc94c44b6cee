use clap::Parser;
use numscan_cli::{resolve_config, Cli};
use numscan_core::OutputFormat;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_flags_take_precedence_over_config_file() {
    let tmp = TempDir::new().expect("create temp dir");
    let path = tmp.path().join("numscan.toml");
    fs::write(
        &path,
        r#"
[scanning]
concurrency = 2
delay_ms = 900

[directory]
base_url = "https://directory.example"

[output]
format = "jid"
"#,
    )
    .expect("write config");

    let cli = Cli::try_parse_from([
        "numscan",
        "--config",
        path.to_str().expect("utf8 path"),
        "--concurrency",
        "6",
        "1555x",
    ])
    .expect("parse args");

    let config = resolve_config(&cli).expect("resolve config");
    assert_eq!(config.scanning.concurrency, 6);
    assert_eq!(config.scanning.delay_ms, 900);
    assert_eq!(config.output.format, OutputFormat::Jid);
    assert!(config.directory.base_url.starts_with("http"));
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    let tmp = TempDir::new().expect("create temp dir");
    let path = tmp.path().join("absent.toml");

    let cli = Cli::try_parse_from([
        "numscan",
        "--config",
        path.to_str().expect("utf8 path"),
        "1555x",
    ])
    .expect("parse args");

    let err = resolve_config(&cli).expect_err("missing config file");
    assert!(format!("{err:#}").contains("config file not found"));
}

#[test]
fn test_zero_max_candidates_rejected() {
    let tmp = TempDir::new().expect("create temp dir");
    let path = tmp.path().join("numscan.toml");
    fs::write(&path, "").expect("write config");

    let cli = Cli::try_parse_from([
        "numscan",
        "--config",
        path.to_str().expect("utf8 path"),
        "--max-candidates",
        "0",
        "1555x",
    ])
    .expect("parse args");

    assert!(resolve_config(&cli).is_err());
}
