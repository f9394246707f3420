//! GeoCRS Store - CRS stores and the registry that searches them
//!
//! A store is loaded from a `CrsResource` (TOML file, TOML string, or the
//! bundled default definitions). The registry keeps stores in registration
//! order and resolves codes across them.

pub mod definition;
pub mod ports;
pub mod provider;
pub mod registry;
pub mod resources;
pub mod store;

pub use definition::{DirectTransformation, StoreDefinition};
pub use ports::{CrsResource, CrsStoreProvider, StoreListener};
pub use provider::ProviderRegistry;
pub use registry::{CrsRegistry, DirectMatch, DEFAULT_STORE_ID};
pub use resources::{DefaultResource, TomlFileResource, TomlStringResource};
pub use store::{CrsStore, StoreTransformation};
