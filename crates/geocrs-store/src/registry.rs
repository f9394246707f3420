//! Registry of CRS stores
//!
//! Stores are searched in registration order. Registration, removal and
//! reload take the write lock only to swap the store list; loading happens
//! before the lock is taken, so lookups never wait on a resource being read.

use crate::definition::DirectTransformation;
use crate::ports::{CrsResource, StoreListener};
use crate::provider::ProviderRegistry;
use crate::resources::DefaultResource;
use crate::store::{CrsStore, StoreTransformation};
use geocrs_core::code::CrsCode;
use geocrs_core::config::{EngineSettings, LayeredConfig};
use geocrs_core::error::{CrsError, Result};
use geocrs_core::models::{Crs, DatumShiftStrategy};
use geocrs_geo::{GridResolver, Ntv2Grid};
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock, Weak};

/// Id under which the bundled definitions are registered
pub const DEFAULT_STORE_ID: &str = "default";

static GLOBAL: OnceLock<CrsRegistry> = OnceLock::new();

/// A store transformation found for a CRS pair
#[derive(Debug, Clone, PartialEq)]
pub struct DirectMatch {
    pub store: String,
    pub transformation: DirectTransformation,
    /// The record is defined target to source
    pub reversed: bool,
}

struct Entry {
    store: Arc<CrsStore>,
    resource: Arc<dyn CrsResource>,
}

pub struct CrsRegistry {
    entries: RwLock<Vec<Entry>>,
    providers: ProviderRegistry,
    listeners: RwLock<Vec<Weak<dyn StoreListener>>>,
}

impl CrsRegistry {
    /// An empty registry with the builtin providers
    pub fn new() -> Self {
        Self::with_providers(ProviderRegistry::with_builtin())
    }

    pub fn with_providers(providers: ProviderRegistry) -> Self {
        Self { entries: RwLock::new(Vec::new()), providers, listeners: RwLock::new(Vec::new()) }
    }

    /// A registry holding the bundled store under `DEFAULT_STORE_ID`
    pub fn with_default_store() -> Result<Self> {
        let registry = Self::new();
        registry.register(DEFAULT_STORE_ID, Arc::new(DefaultResource))?;
        Ok(registry)
    }

    pub fn from_settings(settings: &EngineSettings) -> Result<Self> {
        if settings.load_default_store {
            Self::with_default_store()
        } else {
            Ok(Self::new())
        }
    }

    /// Process-wide registry, built on first use from the environment
    /// configuration
    pub fn global() -> &'static CrsRegistry {
        GLOBAL.get_or_init(|| {
            let settings = LayeredConfig::with_defaults().load_from_env().settings();
            match Self::from_settings(&settings) {
                Ok(registry) => registry,
                Err(e) => {
                    tracing::warn!("Bundled CRS store failed to load: {}", e);
                    Self::new()
                }
            }
        })
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Load `resource` and append it as store `id`. Nothing becomes visible
    /// unless the whole resource loads.
    pub fn register(&self, id: &str, resource: Arc<dyn CrsResource>) -> Result<Arc<CrsStore>> {
        if self.get(id).is_some() {
            return Err(duplicate(id));
        }
        let store = Arc::new(CrsStore::load(id, resource.as_ref())?);
        {
            let mut entries = self.entries.write();
            if entries.iter().any(|e| e.store.id() == id) {
                return Err(duplicate(id));
            }
            entries.push(Entry { store: Arc::clone(&store), resource });
        }
        tracing::info!(store = %id, location = %store.location(), crs = store.len(), "Registered CRS store");
        Ok(store)
    }

    /// Register through a named provider
    pub fn register_with(&self, provider: &str, id: &str, location: &str) -> Result<Arc<CrsStore>> {
        let resource = self.providers.create(provider, location)?;
        self.register(id, resource)
    }

    pub fn get(&self, id: &str) -> Option<Arc<CrsStore>> {
        self.entries.read().iter().find(|e| e.store.id() == id).map(|e| Arc::clone(&e.store))
    }

    /// Store ids in registration order
    pub fn store_ids(&self) -> Vec<String> {
        self.entries.read().iter().map(|e| e.store.id().to_string()).collect()
    }

    pub fn stores(&self) -> Vec<Arc<CrsStore>> {
        self.entries.read().iter().map(|e| Arc::clone(&e.store)).collect()
    }

    /// Search every store in registration order
    pub fn lookup(&self, code: &str) -> Result<Arc<Crs>> {
        self.lookup_code(&CrsCode::parse(code))
    }

    pub fn lookup_code(&self, code: &CrsCode) -> Result<Arc<Crs>> {
        self.lookup_code_with(code, false)
    }

    /// `lookup`, optionally forcing lon/lat or x/y axis order
    pub fn lookup_with(&self, code: &str, force_east_north: bool) -> Result<Arc<Crs>> {
        self.lookup_code_with(&CrsCode::parse(code), force_east_north)
    }

    pub fn lookup_code_with(&self, code: &CrsCode, force_east_north: bool) -> Result<Arc<Crs>> {
        for store in self.stores() {
            if store.contains(code) {
                tracing::debug!(code = %code, store = %store.id(), force_east_north, "CRS lookup");
                return store.lookup_with(code, force_east_north);
            }
        }
        tracing::debug!(code = %code, "CRS lookup found nothing");
        Err(CrsError::UnknownCrs { code: code.to_string(), store: None })
    }

    /// Search one store only
    pub fn lookup_in(&self, store_id: &str, code: &str) -> Result<Arc<Crs>> {
        self.lookup_in_with(store_id, code, false)
    }

    pub fn lookup_in_with(&self, store_id: &str, code: &str, force_east_north: bool) -> Result<Arc<Crs>> {
        let code = CrsCode::parse(code);
        let store = self
            .get(store_id)
            .ok_or_else(|| CrsError::UnknownCrs { code: code.to_string(), store: Some(store_id.to_string()) })?;
        store.lookup_with(&code, force_east_north)
    }

    /// A store transformation record by id
    pub fn transformation(&self, store_id: &str, id: &str) -> Result<StoreTransformation> {
        let store = self.get(store_id).ok_or_else(|| not_registered(store_id))?;
        store.transformation(id).cloned().ok_or_else(|| CrsError::CrsStore {
            store: store_id.to_string(),
            reason: format!("no transformation with id {}", id),
        })
    }

    /// Whether `crs` came from the currently registered instance of its
    /// store. CRSs without a store are always current.
    pub fn is_current(&self, crs: &Arc<Crs>) -> bool {
        match crs.store.as_deref() {
            None => true,
            Some(id) => self.get(id).is_some_and(|store| store.is_current(crs)),
        }
    }

    /// Tear a store down. Its cached CRSs are released once no caller holds
    /// them, and listeners drop anything derived from it.
    pub fn remove(&self, id: &str) -> Result<Arc<CrsStore>> {
        let removed = {
            let mut entries = self.entries.write();
            let position = entries.iter().position(|e| e.store.id() == id).ok_or_else(|| not_registered(id))?;
            entries.remove(position).store
        };
        tracing::info!(store = %id, "Removed CRS store");
        for listener in self.live_listeners() {
            listener.store_removed(id);
        }
        Ok(removed)
    }

    /// Re-read a store's resource and swap it in place. On failure the old
    /// store stays registered.
    pub fn reload(&self, id: &str) -> Result<Arc<CrsStore>> {
        let resource = self
            .entries
            .read()
            .iter()
            .find(|e| e.store.id() == id)
            .map(|e| Arc::clone(&e.resource))
            .ok_or_else(|| not_registered(id))?;
        let store = Arc::new(CrsStore::load(id, resource.as_ref())?);
        {
            let mut entries = self.entries.write();
            let entry = entries.iter_mut().find(|e| e.store.id() == id).ok_or_else(|| not_registered(id))?;
            entry.store = Arc::clone(&store);
        }
        tracing::info!(store = %id, crs = store.len(), "Reloaded CRS store");
        for listener in self.live_listeners() {
            listener.store_reloaded(id);
        }
        Ok(store)
    }

    /// Every code of every store, paired with the store id
    pub fn available_codes(&self) -> Vec<(String, CrsCode)> {
        self.stores()
            .iter()
            .flat_map(|s| s.codes().into_iter().map(|c| (s.id().to_string(), c)))
            .collect()
    }

    /// Store transformations defined between the two codes, in either
    /// direction, in store registration order
    pub fn direct_transformations(&self, source: &CrsCode, target: &CrsCode) -> Vec<DirectMatch> {
        self.stores()
            .iter()
            .flat_map(|store| {
                store
                    .direct_transformations(source, target)
                    .into_iter()
                    .map(|(transformation, reversed)| DirectMatch {
                        store: store.id().to_string(),
                        transformation: transformation.clone(),
                        reversed,
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// The first of `direct_transformations`
    pub fn direct_transformation(&self, source: &CrsCode, target: &CrsCode) -> Option<DirectMatch> {
        self.direct_transformations(source, target).into_iter().next()
    }

    /// Strategy preferred by a store; unknown or missing stores prefer Helmert
    pub fn preferred_strategy(&self, store_id: Option<&str>) -> DatumShiftStrategy {
        store_id
            .and_then(|id| self.get(id))
            .map(|s| s.preferred_strategy())
            .unwrap_or_default()
    }

    /// Subscribe to removal and reload. The registry holds the listener
    /// weakly; dropping the last `Arc` unsubscribes it.
    pub fn add_listener<L: StoreListener + 'static>(&self, listener: &Arc<L>) {
        let weak: Weak<L> = Arc::downgrade(listener);
        let weak: Weak<dyn StoreListener> = weak;
        let mut listeners = self.listeners.write();
        listeners.retain(|l| l.strong_count() > 0);
        listeners.push(weak);
    }

    fn live_listeners(&self) -> Vec<Arc<dyn StoreListener>> {
        self.listeners.read().iter().filter_map(|l| l.upgrade()).collect()
    }
}

impl Default for CrsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CrsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrsRegistry").field("stores", &self.store_ids()).finish()
    }
}

impl GridResolver for CrsRegistry {
    fn grid(&self, name: &str) -> Result<Arc<Ntv2Grid>> {
        self.stores()
            .iter()
            .find_map(|s| s.grid(name))
            .ok_or_else(|| CrsError::out_of_domain(format!("NTv2 grid '{}' is not loaded by any store", name)))
    }
}

fn duplicate(id: &str) -> CrsError {
    CrsError::CrsStore { store: id.to_string(), reason: "a store with this id is already registered".to_string() }
}

fn not_registered(id: &str) -> CrsError {
    CrsError::CrsStore { store: id.to_string(), reason: "no store with this id is registered".to_string() }
}
