//! Store resource adapters

use crate::definition::StoreDefinition;
use crate::ports::CrsResource;
use geocrs_core::error::{CrsError, Result};
use std::path::PathBuf;

const DEFAULT_DEFINITIONS: &str = include_str!("../data/default.toml");

/// A TOML file; grid files are resolved relative to its directory
#[derive(Debug, Clone)]
pub struct TomlFileResource {
    path: PathBuf,
}

impl TomlFileResource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CrsResource for TomlFileResource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<StoreDefinition> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| CrsError::CrsStore {
            store: self.location(),
            reason: format!("cannot read file: {}", e),
        })?;
        let definition = StoreDefinition::from_toml(&content)?;
        Ok(match self.path.parent() {
            Some(dir) => definition.with_base_dir(dir),
            None => definition,
        })
    }
}

/// TOML held in memory
#[derive(Debug, Clone)]
pub struct TomlStringResource {
    name: String,
    content: String,
    base_dir: Option<PathBuf>,
}

impl TomlStringResource {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self { name: name.into(), content: content.into(), base_dir: None }
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }
}

impl CrsResource for TomlStringResource {
    fn location(&self) -> String {
        format!("memory:{}", self.name)
    }

    fn load(&self) -> Result<StoreDefinition> {
        let definition = StoreDefinition::from_toml(&self.content)?;
        Ok(match &self.base_dir {
            Some(dir) => definition.with_base_dir(dir.clone()),
            None => definition,
        })
    }
}

/// The definitions compiled into the crate: WGS 84, ETRS89, DHDN, Amersfoort,
/// NAD83, ED50, Batavia and common projected and geocentric CRSs
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResource;

impl CrsResource for DefaultResource {
    fn location(&self) -> String {
        "builtin:default".to_string()
    }

    fn load(&self) -> Result<StoreDefinition> {
        StoreDefinition::from_toml(DEFAULT_DEFINITIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_definitions_parse() {
        let def = DefaultResource.load().unwrap();
        assert!(def.crs.len() >= 15);
        assert!(def.datums.iter().any(|d| d.id == "epsg:6314"));
    }

    #[test]
    fn test_file_resource_sets_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "preferred_strategy = \"helmert\"").unwrap();

        let def = TomlFileResource::new(&path).load().unwrap();
        assert_eq!(def.base_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_missing_file_is_store_error() {
        let err = TomlFileResource::new("/nonexistent/store.toml").load().unwrap_err();
        assert!(matches!(err, CrsError::CrsStore { .. }));
    }
}
