// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use live_overlay::Config;
use live_overlay::errors::ConfigError;
use live_overlay::pipeline::CaptureSource;
use std::path::PathBuf;
use std::time::Duration;

fn temp_config(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("live-overlay-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_config_default() {
    let config = Config::default();

    assert!(
        config.mirror_preview,
        "Mirror preview should be enabled by default"
    );
    assert_eq!(config.device, "/dev/video0");
    assert_eq!((config.width, config.height), (320, 240));
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_file_keeps_defaults() {
    let path = temp_config("partial.json", r#"{ "device": "test", "gui": false }"#);
    let config = Config::load_from(&path).unwrap();

    assert_eq!(config.device, "test");
    assert!(!config.gui);
    assert_eq!(config.width, 320);
    assert_eq!(config.frame_timeout_ms, 5000);
}

#[test]
fn test_invalid_json_is_parse_error() {
    let path = temp_config("broken.json", "{ device: ");
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_missing_file_is_read_error() {
    let path = std::env::temp_dir().join("live-overlay-definitely-missing.json");
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::Read(_))
    ));
}

#[test]
fn test_zero_resolution_rejected() {
    let path = temp_config("zero.json", r#"{ "width": 0 }"#);
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_save_and_reload() {
    let path = std::env::temp_dir()
        .join(format!("live-overlay-test-{}", std::process::id()))
        .join("nested")
        .join("saved.json");
    let config = Config {
        device: "/dev/video3".into(),
        max_frames: Some(12),
        ..Default::default()
    };
    config.save_to(&path).unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), config);
}

#[test]
fn test_to_options() {
    let config = Config {
        device: "test".into(),
        gui: false,
        mirror_preview: false,
        frame_timeout_ms: 250,
        ..Default::default()
    };
    let options = config.to_options();

    assert_eq!(options.source, CaptureSource::TestPattern);
    assert!(!options.want_gui);
    assert!(!options.mirror);
    assert_eq!(options.frame_timeout, Duration::from_millis(250));
}
