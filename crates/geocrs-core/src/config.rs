use crate::error::{CrsError, Result};
use crate::models::transformation::DatumShiftStrategy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Rule deciding the datum-shift strategy when the source and target stores
/// prefer different ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TieBreak {
    /// Use Helmert unless both stores prefer NTv2
    #[default]
    Helmert,
    /// Use NTv2 if either store prefers it
    Ntv2,
    /// Follow the source CRS's store
    Source,
    /// Follow the target CRS's store
    Target,
}

impl TieBreak {
    pub fn resolve(&self, source: DatumShiftStrategy, target: DatumShiftStrategy) -> DatumShiftStrategy {
        if source == target {
            return source;
        }
        match self {
            TieBreak::Helmert => DatumShiftStrategy::Helmert,
            TieBreak::Ntv2 => DatumShiftStrategy::Ntv2,
            TieBreak::Source => source,
            TieBreak::Target => target,
        }
    }
}

/// Plain snapshot of the engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub chain_cache_capacity: usize,
    pub datum_shift_tie_break: TieBreak,
    pub parallel_threshold: usize,
    pub load_default_store: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        LayeredConfig::with_defaults().settings()
    }
}

/// Layered configuration for GeoCRS
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub chain_cache_capacity: ConfigValue<usize>,
    pub datum_shift_tie_break: ConfigValue<TieBreak>,
    pub parallel_threshold: ConfigValue<usize>,
    pub load_default_store: ConfigValue<bool>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            chain_cache_capacity: ConfigValue::new(256, ConfigSource::Default),
            datum_shift_tie_break: ConfigValue::new(TieBreak::Helmert, ConfigSource::Default),
            parallel_threshold: ConfigValue::new(4096, ConfigSource::Default),
            load_default_store: ConfigValue::new(true, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| CrsError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("Failed to read config file: {}", e),
        })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| CrsError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(capacity) = file_config.chain_cache_capacity {
            self.chain_cache_capacity.update(check_capacity(capacity)?, ConfigSource::File);
        }

        if let Some(tie_break) = file_config.datum_shift_tie_break {
            self.datum_shift_tie_break.update(tie_break, ConfigSource::File);
        }

        if let Some(threshold) = file_config.parallel_threshold {
            self.parallel_threshold.update(threshold, ConfigSource::File);
        }

        if let Some(load) = file_config.load_default_store {
            self.load_default_store.update(load, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // GEOCRS_CHAIN_CACHE_CAPACITY
        if let Ok(capacity_str) = env::var("GEOCRS_CHAIN_CACHE_CAPACITY") {
            match capacity_str.parse::<usize>() {
                Ok(capacity) if capacity > 0 => {
                    self.chain_cache_capacity.update(capacity, ConfigSource::Environment)
                }
                _ => tracing::warn!(
                    "Invalid GEOCRS_CHAIN_CACHE_CAPACITY value '{}': expected a positive integer",
                    capacity_str
                ),
            }
        }

        // GEOCRS_DATUM_SHIFT_TIE_BREAK
        if let Ok(tie_break_str) = env::var("GEOCRS_DATUM_SHIFT_TIE_BREAK") {
            match parse_tie_break(&tie_break_str) {
                Ok(tie_break) => {
                    self.datum_shift_tie_break.update(tie_break, ConfigSource::Environment)
                }
                Err(_) => tracing::warn!(
                    "Invalid GEOCRS_DATUM_SHIFT_TIE_BREAK value '{}': expected helmert, ntv2, source, or target",
                    tie_break_str
                ),
            }
        }

        // GEOCRS_PARALLEL_THRESHOLD
        if let Ok(threshold_str) = env::var("GEOCRS_PARALLEL_THRESHOLD") {
            match threshold_str.parse::<usize>() {
                Ok(threshold) => self.parallel_threshold.update(threshold, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid GEOCRS_PARALLEL_THRESHOLD value '{}': expected an integer",
                    threshold_str
                ),
            }
        }

        // GEOCRS_LOAD_DEFAULT_STORE
        if let Ok(load_str) = env::var("GEOCRS_LOAD_DEFAULT_STORE") {
            match parse_bool(&load_str) {
                Some(load) => self.load_default_store.update(load, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid GEOCRS_LOAD_DEFAULT_STORE value '{}': expected true or false",
                    load_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(capacity) = overrides.chain_cache_capacity {
            self.chain_cache_capacity.update(capacity.max(1), ConfigSource::Cli);
        }

        if let Some(tie_break) = overrides.datum_shift_tie_break {
            self.datum_shift_tie_break.update(tie_break, ConfigSource::Cli);
        }

        if let Some(threshold) = overrides.parallel_threshold {
            self.parallel_threshold.update(threshold, ConfigSource::Cli);
        }

        if let Some(load) = overrides.load_default_store {
            self.load_default_store.update(load, ConfigSource::Cli);
        }
    }

    /// Current values without their sources
    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            chain_cache_capacity: self.chain_cache_capacity.value,
            datum_shift_tie_break: self.datum_shift_tie_break.value,
            parallel_threshold: self.parallel_threshold.value,
            load_default_store: self.load_default_store.value,
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "chain_cache_capacity".to_string(),
            (self.chain_cache_capacity.value.to_string(), self.chain_cache_capacity.source),
        );

        map.insert(
            "datum_shift_tie_break".to_string(),
            (format!("{:?}", self.datum_shift_tie_break.value), self.datum_shift_tie_break.source),
        );

        map.insert(
            "parallel_threshold".to_string(),
            (self.parallel_threshold.value.to_string(), self.parallel_threshold.source),
        );

        map.insert(
            "load_default_store".to_string(),
            (self.load_default_store.value.to_string(), self.load_default_store.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    chain_cache_capacity: Option<usize>,
    datum_shift_tie_break: Option<TieBreak>,
    parallel_threshold: Option<usize>,
    load_default_store: Option<bool>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub chain_cache_capacity: Option<usize>,
    pub datum_shift_tie_break: Option<TieBreak>,
    pub parallel_threshold: Option<usize>,
    pub load_default_store: Option<bool>,
}

/// Parse a tie-break rule from string
pub fn parse_tie_break(s: &str) -> Result<TieBreak> {
    match s.to_lowercase().as_str() {
        "helmert" => Ok(TieBreak::Helmert),
        "ntv2" => Ok(TieBreak::Ntv2),
        "source" => Ok(TieBreak::Source),
        "target" => Ok(TieBreak::Target),
        _ => Err(CrsError::ConfigInvalid {
            key: "datum_shift_tie_break".to_string(),
            reason: format!("Invalid tie-break rule: {}. Use helmert, ntv2, source, or target", s),
        }),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn check_capacity(capacity: usize) -> Result<usize> {
    if capacity == 0 {
        return Err(CrsError::ConfigInvalid {
            key: "chain_cache_capacity".to_string(),
            reason: "capacity must be at least 1".to_string(),
        });
    }
    Ok(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.chain_cache_capacity.value, 256);
        assert_eq!(config.chain_cache_capacity.source, ConfigSource::Default);
        assert_eq!(config.datum_shift_tie_break.value, TieBreak::Helmert);
        assert_eq!(config.parallel_threshold.value, 4096);
        assert!(config.load_default_store.value);
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        // File should override default
        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        // Environment should override file
        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);

        // CLI should override environment
        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
chain_cache_capacity = 16
datum_shift_tie_break = "Ntv2"
parallel_threshold = 100
load_default_store = false
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.chain_cache_capacity.value, 16);
        assert_eq!(config.chain_cache_capacity.source, ConfigSource::File);
        assert_eq!(config.datum_shift_tie_break.value, TieBreak::Ntv2);
        assert_eq!(config.parallel_threshold.value, 100);
        assert!(!config.load_default_store.value);
    }

    #[test]
    fn test_zero_capacity_in_file_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "chain_cache_capacity = 0").unwrap();
        let result = LayeredConfig::with_defaults().load_from_file(file.path());
        assert!(matches!(result, Err(CrsError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        let overrides = CliConfigOverrides {
            chain_cache_capacity: Some(8),
            datum_shift_tie_break: Some(TieBreak::Target),
            parallel_threshold: None,
            load_default_store: None,
        };

        config.update_from_cli(overrides);

        assert_eq!(config.chain_cache_capacity.value, 8);
        assert_eq!(config.chain_cache_capacity.source, ConfigSource::Cli);
        assert_eq!(config.datum_shift_tie_break.value, TieBreak::Target);
        assert_eq!(config.parallel_threshold.source, ConfigSource::Default);
        assert_eq!(config.load_default_store.source, ConfigSource::Default);
    }

    #[test]
    fn test_tie_break_resolution() {
        use DatumShiftStrategy::{Helmert, Ntv2};
        assert_eq!(TieBreak::Helmert.resolve(Ntv2, Ntv2), Ntv2);
        assert_eq!(TieBreak::Helmert.resolve(Ntv2, Helmert), Helmert);
        assert_eq!(TieBreak::Ntv2.resolve(Helmert, Ntv2), Ntv2);
        assert_eq!(TieBreak::Ntv2.resolve(Helmert, Helmert), Helmert);
        assert_eq!(TieBreak::Source.resolve(Ntv2, Helmert), Ntv2);
        assert_eq!(TieBreak::Target.resolve(Ntv2, Helmert), Helmert);
    }

    #[test]
    fn test_parse_tie_break() {
        assert_eq!(parse_tie_break("HELMERT").unwrap(), TieBreak::Helmert);
        assert_eq!(parse_tie_break("source").unwrap(), TieBreak::Source);
        assert!(parse_tie_break("grid").is_err());
    }

    #[test]
    fn test_inspection_map() {
        let config = LayeredConfig::with_defaults();
        let map = config.to_inspection_map();

        assert_eq!(map.len(), 4);
        let (capacity, source) = &map["chain_cache_capacity"];
        assert_eq!(capacity, "256");
        assert_eq!(*source, ConfigSource::Default);
        assert_eq!(map["datum_shift_tie_break"].0, "Helmert");
    }
}
