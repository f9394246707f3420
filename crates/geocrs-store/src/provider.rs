//! Named store constructors
//!
//! Providers are registered explicitly at start-up; nothing is discovered at
//! runtime.

use crate::ports::{CrsResource, CrsStoreProvider};
use crate::resources::{DefaultResource, TomlFileResource};
use geocrs_core::error::{CrsError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Creates `TomlFileResource`s; the location is a file path
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlProvider;

impl CrsStoreProvider for TomlProvider {
    fn name(&self) -> &str {
        "toml"
    }

    fn create(&self, location: &str) -> Result<Arc<dyn CrsResource>> {
        Ok(Arc::new(TomlFileResource::new(location)))
    }
}

/// The bundled definitions; the location is ignored
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProvider;

impl CrsStoreProvider for DefaultProvider {
    fn name(&self) -> &str {
        "default"
    }

    fn create(&self, _location: &str) -> Result<Arc<dyn CrsResource>> {
        Ok(Arc::new(DefaultResource))
    }
}

#[derive(Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn CrsStoreProvider>>,
}

impl ProviderRegistry {
    /// No providers at all
    pub fn empty() -> Self {
        Self { providers: BTreeMap::new() }
    }

    /// The `toml` and `default` providers
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(TomlProvider));
        registry.register(Arc::new(DefaultProvider));
        registry
    }

    /// Add a provider, replacing any with the same name
    pub fn register(&mut self, provider: Arc<dyn CrsStoreProvider>) {
        self.providers.insert(provider.name().to_lowercase(), provider);
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    pub fn create(&self, provider: &str, location: &str) -> Result<Arc<dyn CrsResource>> {
        let found = self.providers.get(&provider.to_lowercase()).ok_or_else(|| CrsError::CrsStore {
            store: location.to_string(),
            reason: format!("no store provider named '{}' (known: {})", provider, self.names().join(", ")),
        })?;
        found.create(location)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry").field("providers", &self.names()).finish()
    }
}
