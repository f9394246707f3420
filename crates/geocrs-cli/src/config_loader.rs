//! Configuration and registry setup shared by all commands

use crate::cli::Cli;
use anyhow::{bail, Context, Result};
use geocrs_core::config::{parse_tie_break, CliConfigOverrides, LayeredConfig};
use geocrs_store::CrsRegistry;
use geocrs_transform::TransformationFactory;
use std::sync::Arc;

/// Defaults, then the `--config` file, then the environment, then flags
pub fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();
    if let Some(path) = &cli.config {
        config = config
            .load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    }
    let mut config = config.load_from_env();

    let mut overrides = CliConfigOverrides::default();
    if let Some(rule) = &cli.tie_break {
        overrides.datum_shift_tie_break = Some(parse_tie_break(rule)?);
    }
    if cli.no_default_store {
        overrides.load_default_store = Some(false);
    }
    config.update_from_cli(overrides);
    Ok(config)
}

/// Split `ID=PATH`
pub fn parse_store_arg(arg: &str) -> Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((id, path)) if !id.trim().is_empty() && !path.trim().is_empty() => Ok((id.trim(), path.trim())),
        _ => bail!("Invalid --store value '{}': expected ID=PATH", arg),
    }
}

/// The registry with the bundled store (unless disabled) and every `--store`
pub fn build_registry(cli: &Cli, config: &LayeredConfig) -> Result<Arc<CrsRegistry>> {
    let registry = CrsRegistry::from_settings(&config.settings()).context("Failed to load the bundled CRS store")?;
    for arg in &cli.stores {
        let (id, path) = parse_store_arg(arg)?;
        registry
            .register_with("toml", id, path)
            .with_context(|| format!("Failed to register store '{}' from {}", id, path))?;
    }
    Ok(Arc::new(registry))
}

pub fn build_factory(cli: &Cli, config: &LayeredConfig) -> Result<TransformationFactory> {
    let registry = build_registry(cli, config)?;
    Ok(TransformationFactory::new(registry, config.settings()))
}
