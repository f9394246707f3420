//! Bounded cache of resolved chains

use crate::chain::TransformationChain;
use dashmap::DashMap;
use geocrs_core::models::{AxisOrder, Crs};
use geocrs_store::StoreListener;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cache key: each CRS's canonical id qualified by the store it came from.
/// North/east axis order is marked so a forced east/north variant keys apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainKey {
    pub source: String,
    pub target: String,
}

impl ChainKey {
    pub fn new(source: &Crs, target: &Crs) -> Self {
        Self { source: qualified(source), target: qualified(target) }
    }
}

fn qualified(crs: &Crs) -> String {
    let axes = match crs.axis_order() {
        Some(AxisOrder::NorthEast) => "/ne",
        _ => "",
    };
    format!("{}@{}{}", crs.id(), crs.store.as_deref().unwrap_or("-"), axes)
}

/// Chains keyed by CRS pair. Oldest entries are evicted first once
/// `capacity` is exceeded; a capacity of zero disables caching.
#[derive(Debug)]
pub struct ChainCache {
    capacity: usize,
    entries: DashMap<ChainKey, Arc<TransformationChain>>,
    order: Mutex<VecDeque<ChainKey>>,
    /// Bumped by every invalidation
    epoch: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ChainCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            epoch: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, key: &ChainKey) -> Option<Arc<TransformationChain>> {
        let found = self.entries.get(key).map(|e| Arc::clone(e.value()));
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Read before resolving a chain, then hand to `insert_since`
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Insert a chain. When another thread cached the same pair first, its
    /// chain is kept and returned.
    pub fn insert(&self, key: ChainKey, chain: Arc<TransformationChain>) -> Arc<TransformationChain> {
        self.insert_since(self.epoch(), key, chain)
    }

    /// Insert a chain resolved after `epoch` was read. If a store was
    /// invalidated in between, the chain is returned without being cached.
    pub fn insert_since(&self, epoch: u64, key: ChainKey, chain: Arc<TransformationChain>) -> Arc<TransformationChain> {
        if self.capacity == 0 {
            return chain;
        }
        let mut order = self.order.lock();
        if self.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!(source = %key.source, target = %key.target, "Store changed during resolve, chain not cached");
            return chain;
        }
        let stored = Arc::clone(self.entries.entry(key.clone()).or_insert(chain).value());
        if !order.contains(&key) {
            order.push_back(key);
        }
        while order.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                self.entries.remove(&oldest);
                tracing::debug!(source = %oldest.source, target = %oldest.target, "Evicted cached chain");
            }
        }
        stored
    }

    /// Drop every chain built from definitions of `store_id`
    pub fn invalidate_store(&self, store_id: &str) -> usize {
        let mut order = self.order.lock();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let before = self.entries.len();
        self.entries.retain(|_, chain| !chain.involves_store(store_id));
        order.retain(|key| self.entries.contains_key(key));
        let dropped = before - self.entries.len();
        if dropped > 0 {
            tracing::info!(store = store_id, dropped, "Invalidated cached chains");
        }
        dropped
    }

    pub fn clear(&self) {
        let mut order = self.order.lock();
        self.entries.clear();
        order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed))
    }
}

impl StoreListener for ChainCache {
    fn store_removed(&self, store_id: &str) {
        self.invalidate_store(store_id);
    }

    fn store_reloaded(&self, store_id: &str) {
        self.invalidate_store(store_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocrs_core::code::CrsCode;
    use geocrs_core::models::{
        AngularUnit, AxisOrder, CrsIdentifier, CrsKind, GeodeticDatum, GeographicCrs, Transformation,
    };
    use geocrs_geo::PreparedTransformation;

    fn crs(code: &str, store: &str) -> Arc<Crs> {
        Arc::new(
            Crs::new(
                CrsIdentifier::single(CrsCode::parse(code), code),
                CrsKind::Geographic(GeographicCrs::new(GeodeticDatum::wgs84(), AxisOrder::EastNorth, AngularUnit::Degree)),
            )
            .with_store(store),
        )
    }

    fn chain(source: &str, target: &str, store: &str) -> (ChainKey, Arc<TransformationChain>) {
        let (s, t) = (crs(source, store), crs(target, store));
        let key = ChainKey::new(&s, &t);
        let chain = TransformationChain::new(s, t, Transformation::Identity, PreparedTransformation::default(), vec![]);
        (key, Arc::new(chain))
    }

    #[test]
    fn test_key_includes_store() {
        let a = ChainKey::new(&crs("EPSG:4326", "one"), &crs("EPSG:4258", "one"));
        let b = ChainKey::new(&crs("EPSG:4326", "two"), &crs("EPSG:4258", "one"));
        assert_ne!(a, b);
        assert_eq!(a.source, "epsg:4326@one");
    }

    #[test]
    fn test_hit_and_miss() {
        let cache = ChainCache::new(4);
        let (key, value) = chain("A:1", "A:2", "s");
        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), value.clone());
        assert!(Arc::ptr_eq(&cache.get(&key).unwrap(), &value));
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = ChainCache::new(4);
        let (key, first) = chain("A:1", "A:2", "s");
        let (_, second) = chain("A:1", "A:2", "s");
        cache.insert(key.clone(), first.clone());
        let stored = cache.insert(key, second);
        assert!(Arc::ptr_eq(&stored, &first));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicts_oldest() {
        let cache = ChainCache::new(2);
        let (k1, c1) = chain("A:1", "A:2", "s");
        let (k2, c2) = chain("A:1", "A:3", "s");
        let (k3, c3) = chain("A:1", "A:4", "s");
        cache.insert(k1.clone(), c1);
        cache.insert(k2.clone(), c2);
        cache.insert(k3.clone(), c3);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&k1).is_none());
        assert!(cache.get(&k2).is_some());
        assert!(cache.get(&k3).is_some());
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let cache = ChainCache::new(0);
        let (key, value) = chain("A:1", "A:2", "s");
        cache.insert(key.clone(), value);
        assert!(cache.is_empty());
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_key_marks_north_east_axes() {
        let lat_lon = Crs::new(
            CrsIdentifier::single(CrsCode::parse("X:1"), "lat/lon"),
            CrsKind::Geographic(GeographicCrs::new(GeodeticDatum::wgs84(), AxisOrder::NorthEast, AngularUnit::Degree)),
        )
        .with_store("s");
        let forced = lat_lon.force_east_north();
        let target = crs("A:2", "s");
        assert_eq!(ChainKey::new(&lat_lon, &target).source, "x:1@s/ne");
        assert_ne!(ChainKey::new(&lat_lon, &target), ChainKey::new(&forced, &target));
    }

    #[test]
    fn test_insert_after_invalidation_is_skipped() {
        let cache = ChainCache::new(4);
        let (key, value) = chain("A:1", "A:2", "s");
        let epoch = cache.epoch();
        cache.store_reloaded("s");
        let returned = cache.insert_since(epoch, key.clone(), value.clone());
        assert!(Arc::ptr_eq(&returned, &value));
        assert!(cache.is_empty());

        cache.insert_since(cache.epoch(), key.clone(), value);
        assert!(cache.get(&key).is_some());
    }

    #[test]
    fn test_invalidate_store() {
        let cache = ChainCache::new(8);
        let (k1, c1) = chain("A:1", "A:2", "keep");
        let (k2, c2) = chain("B:1", "B:2", "drop");
        cache.insert(k1.clone(), c1);
        cache.insert(k2.clone(), c2);

        cache.store_reloaded("drop");
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&k1).is_some());
        assert!(cache.get(&k2).is_none());

        cache.store_removed("keep");
        assert!(cache.is_empty());
    }
}
