// alice-host/tests/config_tests.rs
//
// HostConfig loading and CLI overrides.

use std::io::Write;

use alice_host::{Cli, HostConfig, PowerPreference};
use clap::Parser;

// ════════════════════════════════════════════════════════════════════
// HostConfig
// ════════════════════════════════════════════════════════════════════

#[test]
fn test_defaults() {
    let config = HostConfig::default();
    assert_eq!(config.window.title, "Alice");
    assert_eq!((config.window.width, config.window.height), (1280, 720));
    assert_eq!(config.clear_color, [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(config.memory_pages, 256);
    assert_eq!(config.frame_fuel, None);
    assert_eq!(config.log_filter, None);
    assert_eq!(config.power_preference, PowerPreference::HighPerformance);
    assert_eq!(config.headless.frames, 60);
}

#[test]
fn test_empty_object_is_default() {
    assert_eq!(HostConfig::from_json("{}").unwrap(), HostConfig::default());
}

#[test]
fn test_partial_override_keeps_other_defaults() {
    let config = HostConfig::from_json(
        r#"{
            "window": { "title": "demo" },
            "frame_fuel": 5000,
            "power_preference": "low-power",
            "clear_color": [0.1, 0.2, 0.3, 1.0]
        }"#,
    )
    .unwrap();

    assert_eq!(config.window.title, "demo");
    assert_eq!(config.window.width, 1280);
    assert_eq!(config.frame_fuel, Some(5000));
    assert_eq!(config.power_preference, PowerPreference::LowPower);
    assert_eq!(config.memory_pages, 256);

    let surface = config.surface_options();
    assert!(!surface.high_performance);
    assert_eq!(surface.clear_color, [0.1, 0.2, 0.3, 1.0]);

    let session = config.session_options();
    assert_eq!(session.frame_fuel, Some(5000));
    assert_eq!(session.memory_pages, 256);
}

#[test]
fn test_unknown_power_preference_rejected() {
    assert!(HostConfig::from_json(r#"{ "power_preference": "turbo" }"#).is_err());
}

#[test]
fn test_load_explicit_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "memory_pages": 32, "log_filter": "debug" }}"#).unwrap();

    let config = HostConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.memory_pages, 32);
    assert_eq!(config.log_filter.as_deref(), Some("debug"));
}

#[test]
fn test_load_missing_explicit_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = HostConfig::load(Some(path.as_path())).unwrap_err();
    assert!(format!("{err:#}").contains("absent.json"));
}

#[test]
fn test_load_invalid_file_names_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();
    let err = HostConfig::load(Some(file.path())).unwrap_err();
    assert!(format!("{err:#}").contains("invalid config"));
}

#[test]
fn test_default_path_ends_in_host_json() {
    if let Some(path) = HostConfig::default_path() {
        assert!(path.ends_with("host.json"));
    }
}

// ════════════════════════════════════════════════════════════════════
// CLI
// ════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_module_only() {
    let cli = Cli::try_parse_from(["alice-host", "demo.wasm"]).unwrap();
    assert_eq!(cli.module.to_str(), Some("demo.wasm"));
    assert!(!cli.headless);
    assert!(cli.config.is_none());

    let mut config = HostConfig::default();
    cli.apply(&mut config);
    assert_eq!(config, HostConfig::default());
}

#[test]
fn test_cli_overrides_config() {
    let cli = Cli::try_parse_from([
        "alice-host",
        "demo.wat",
        "--headless",
        "--frames",
        "5",
        "--width",
        "640",
        "--height",
        "480",
        "--fuel",
        "100",
    ])
    .unwrap();
    assert!(cli.headless);

    let mut config = HostConfig::default();
    cli.apply(&mut config);
    assert_eq!(config.headless.frames, 5);
    assert_eq!((config.window.width, config.window.height), (640, 480));
    assert_eq!((config.headless.width, config.headless.height), (640, 480));
    assert_eq!(config.frame_fuel, Some(100));
}

#[test]
fn test_cli_requires_module() {
    assert!(Cli::try_parse_from(["alice-host"]).is_err());
}
