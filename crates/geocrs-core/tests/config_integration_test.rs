//! Integration tests for layered configuration
//!
//! Precedence: CLI arguments > Environment variables > Config file > Defaults

use geocrs_core::config::{
    parse_tie_break, CliConfigOverrides, ConfigSource, EngineSettings, LayeredConfig, TieBreak,
};
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

const ENV_KEYS: &[&str] = &[
    "GEOCRS_CHAIN_CACHE_CAPACITY",
    "GEOCRS_DATUM_SHIFT_TIE_BREAK",
    "GEOCRS_PARALLEL_THRESHOLD",
    "GEOCRS_LOAD_DEFAULT_STORE",
];

fn clear_env() {
    for key in ENV_KEYS {
        env::remove_var(key);
    }
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_default_settings_snapshot() {
    let settings = EngineSettings::default();
    assert_eq!(settings.chain_cache_capacity, 256);
    assert_eq!(settings.datum_shift_tie_break, TieBreak::Helmert);
    assert_eq!(settings.parallel_threshold, 4096);
    assert!(settings.load_default_store);
}

#[test]
fn test_partial_file_configuration() {
    let file = config_file("parallel_threshold = 10");
    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.parallel_threshold.value, 10);
    assert_eq!(config.parallel_threshold.source, ConfigSource::File);
    assert_eq!(config.chain_cache_capacity.source, ConfigSource::Default);
    assert_eq!(config.datum_shift_tie_break.source, ConfigSource::Default);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let file = config_file(
        r#"
chain_cache_capacity = 32
datum_shift_tie_break = "Source"
"#,
    );
    env::set_var("GEOCRS_CHAIN_CACHE_CAPACITY", "64");
    env::set_var("GEOCRS_DATUM_SHIFT_TIE_BREAK", "ntv2");

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.chain_cache_capacity.value, 64);
    assert_eq!(config.chain_cache_capacity.source, ConfigSource::Environment);
    assert_eq!(config.datum_shift_tie_break.value, TieBreak::Ntv2);
    assert_eq!(config.datum_shift_tie_break.source, ConfigSource::Environment);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();
    env::set_var("GEOCRS_CHAIN_CACHE_CAPACITY", "0");
    env::set_var("GEOCRS_PARALLEL_THRESHOLD", "lots");
    env::set_var("GEOCRS_LOAD_DEFAULT_STORE", "maybe");
    env::set_var("GEOCRS_DATUM_SHIFT_TIE_BREAK", "coin-flip");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.chain_cache_capacity.value, 256);
    assert_eq!(config.chain_cache_capacity.source, ConfigSource::Default);
    assert_eq!(config.parallel_threshold.source, ConfigSource::Default);
    assert_eq!(config.load_default_store.source, ConfigSource::Default);
    assert_eq!(config.datum_shift_tie_break.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_configuration_precedence_order() {
    clear_env();
    let file = config_file("load_default_store = false\nparallel_threshold = 5");
    env::set_var("GEOCRS_LOAD_DEFAULT_STORE", "yes");

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert!(config.load_default_store.value);
    assert_eq!(config.load_default_store.source, ConfigSource::Environment);

    config.update_from_cli(CliConfigOverrides {
        load_default_store: Some(false),
        parallel_threshold: Some(7),
        ..Default::default()
    });

    assert!(!config.load_default_store.value);
    assert_eq!(config.load_default_store.source, ConfigSource::Cli);
    assert_eq!(config.parallel_threshold.value, 7);

    let settings = config.settings();
    assert_eq!(settings.parallel_threshold, 7);
    assert!(!settings.load_default_store);

    clear_env();
}

#[test]
fn test_invalid_toml_file() {
    let file = config_file("chain_cache_capacity = \"many\"");
    let result = LayeredConfig::with_defaults().load_from_file(file.path());
    assert!(result.is_err());
}

#[test]
fn test_missing_config_file() {
    let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/geocrs.toml");
    assert!(result.is_err());
}

#[test]
fn test_parse_tie_break_variations() {
    assert_eq!(parse_tie_break("Helmert").unwrap(), TieBreak::Helmert);
    assert_eq!(parse_tie_break("NTV2").unwrap(), TieBreak::Ntv2);
    assert_eq!(parse_tie_break("target").unwrap(), TieBreak::Target);
    assert!(parse_tie_break("").is_err());
}
