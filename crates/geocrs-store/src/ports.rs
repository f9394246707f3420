//! Port trait definitions
//!
//! Adapters that feed stores and observers of the registry implement these.

use crate::definition::StoreDefinition;
use geocrs_core::error::Result;
use std::sync::Arc;

/// Backing resource of a store
pub trait CrsResource: Send + Sync {
    /// Human readable location, used in logs and error messages
    fn location(&self) -> String;

    /// Read and parse the resource. Called on registration and on every reload.
    fn load(&self) -> Result<StoreDefinition>;
}

/// Named constructor of store resources, registered at start-up
pub trait CrsStoreProvider: Send + Sync {
    fn name(&self) -> &str;

    fn create(&self, location: &str) -> Result<Arc<dyn CrsResource>>;
}

/// Observer of store teardown and reload
pub trait StoreListener: Send + Sync {
    fn store_removed(&self, store_id: &str);

    fn store_reloaded(&self, store_id: &str);
}
