//! Integration tests for configuration loading and validation.

use rmdemux::config::{load_config, load_config_or_default, validate_config, Config};
use rmdemux_media::{DemuxOptions, IndexMode, DEFAULT_MAX_RESYNC};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn defaults_match_demux_options() {
    let config = Config::default();
    let options = DemuxOptions::from(&config.demux);

    assert_eq!(options, DemuxOptions::default());
    assert_eq!(config.demux.max_resync_attempts, DEFAULT_MAX_RESYNC);
    assert_eq!(config.demux.max_streams, 32);
    assert_eq!(config.output.directory, PathBuf::from("./demuxed"));
}

#[test]
fn load_full_config() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("rmdemux.toml");
    fs::write(
        &path,
        r#"
[demux]
index_mode = "generate"
dump_index = true
max_resync_attempts = 4
max_streams = 2

[output]
directory = "/tmp/streams"
"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.demux.index_mode, IndexMode::Generate);
    assert!(config.demux.dump_index);
    assert_eq!(config.output.directory, PathBuf::from("/tmp/streams"));

    let options = DemuxOptions::from(&config.demux);
    assert_eq!(options.max_resync_attempts, 4);
    assert_eq!(options.max_streams, 2);
}

#[test]
fn missing_sections_use_defaults() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("rmdemux.toml");
    fs::write(&path, "[demux]\nindex_mode = \"off\"\n").unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.demux.index_mode, IndexMode::Off);
    assert_eq!(config.demux.max_streams, 32);
    assert_eq!(config.output.directory, PathBuf::from("./demuxed"));
}

#[test]
fn unknown_index_mode_is_rejected() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("rmdemux.toml");
    fs::write(&path, "[demux]\nindex_mode = \"sometimes\"\n").unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file"));
}

#[test]
fn validation_rejects_zero_limits() {
    let mut config = Config::default();
    config.demux.max_resync_attempts = 0;
    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("max_resync_attempts"));

    let mut config = Config::default();
    config.demux.max_streams = 0;
    assert!(validate_config(&config).is_err());

    let mut config = Config::default();
    config.output.directory = PathBuf::new();
    assert!(validate_config(&config).is_err());
}

#[test]
fn custom_path_takes_precedence() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("custom.toml");
    fs::write(&path, "[demux]\ndump_index = true\n").unwrap();

    let config = load_config_or_default(Some(path.as_path())).unwrap();
    assert!(config.demux.dump_index);
}

#[test]
fn missing_custom_path_is_an_error() {
    let temp = tempdir().unwrap();
    let err = load_config_or_default(Some(temp.path().join("absent.toml").as_path())).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
