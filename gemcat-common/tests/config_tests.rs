//! Unit tests for bootstrap configuration loading
//!
//! Tests cover:
//! - Partial TOML files fill in defaults
//! - Invalid sheet settings are rejected
//! - Explicit missing config paths are an error

use gemcat_common::config::{ConfigSource, SheetConfig, TomlConfig};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_full_toml_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
bind_addr = "0.0.0.0:8080"
request_timeout_secs = 5

[sheet]
source_id = "sheet-123"
sheet_tab = "938507281"
refresh_interval_ms = 2500

[logging]
level = "debug"
"#
    )
    .unwrap();

    let (config, source) = TomlConfig::load(Some(file.path())).unwrap();
    assert_eq!(source, ConfigSource::File(file.path().to_path_buf()));
    assert_eq!(config.bind_addr.port(), 8080);
    assert_eq!(config.request_timeout(), Duration::from_secs(5));
    assert_eq!(config.sheet.source_id, "sheet-123");
    assert_eq!(config.sheet.sheet_tab, "938507281");
    assert_eq!(config.sheet.refresh_interval(), Duration::from_millis(2500));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_partial_toml_uses_defaults() {
    let config = TomlConfig::from_toml_str(
        r#"
[sheet]
source_id = "only-this"
"#,
    )
    .unwrap();

    assert_eq!(config.sheet.source_id, "only-this");
    assert_eq!(config.sheet.sheet_tab, "");
    assert_eq!(config.sheet.refresh_interval_ms, 10_000);
    assert_eq!(config.bind_addr.port(), 5780);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_empty_toml_is_all_defaults() {
    let config = TomlConfig::from_toml_str("").unwrap();
    assert_eq!(config.sheet, SheetConfig::default());
}

#[test]
fn test_blank_source_id_rejected() {
    let result = TomlConfig::from_toml_str(
        r#"
[sheet]
source_id = "   "
"#,
    );
    assert!(result.is_err());
}

#[test]
fn test_malformed_toml_rejected() {
    let result = TomlConfig::from_toml_str("bind_addr = [");
    assert!(result.is_err());
}

#[test]
fn test_explicit_missing_path_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    let err = TomlConfig::load(Some(&missing)).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
}
