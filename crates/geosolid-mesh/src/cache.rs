//! Bounded, least-recently-used cache of canonical meshes.
//!
//! Meshes are keyed by [`MeshKey`] value and handed out as `Arc`s, so every
//! shape instance at the same kind and subdivision count shares one
//! [`CachedMesh`]. When the tracked size exceeds the capacity, least recently
//! used entries are evicted until the size drops to the low-water mark.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use geosolid_config::CacheConfig;
use rustc_hash::FxHashMap;

use crate::cached_mesh::CachedMesh;
use crate::kind::MeshKey;
use crate::tessellator::tessellate;

/// Default byte ceiling for a cache: 32 MiB.
pub const DEFAULT_CAPACITY_BYTES: u64 = 32 * 1024 * 1024;

/// Fraction of the capacity eviction shrinks the cache down to.
pub const DEFAULT_LOW_WATER_RATIO: f64 = 0.85;

static SHARED: OnceLock<Arc<GeometryCache>> = OnceLock::new();

/// Counters describing cache behavior since creation (or the last [`GeometryCache::clear`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Meshes produced by a builder inside [`GeometryCache::get_or_build`].
    pub builds: u64,
    /// Entries dropped to get back under the capacity.
    pub evictions: u64,
    /// Bytes currently tracked.
    pub size_bytes: u64,
    /// Entries currently resident.
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, or 0 before the first lookup.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct Entry {
    mesh: Arc<CachedMesh>,
    size: u64,
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: FxHashMap<MeshKey, Entry>,
    size_bytes: u64,
    clock: u64,
    hits: u64,
    misses: u64,
    builds: u64,
    evictions: u64,
}

impl CacheInner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn lookup(&mut self, key: &MeshKey) -> Option<Arc<CachedMesh>> {
        let now = self.tick();
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.last_used = now;
                self.hits += 1;
                Some(Arc::clone(&entry.mesh))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    fn insert(&mut self, key: MeshKey, mesh: Arc<CachedMesh>) {
        let size = mesh.size_in_bytes();
        let last_used = self.tick();
        if let Some(old) = self.entries.insert(
            key,
            Entry {
                mesh,
                size,
                last_used,
            },
        ) {
            self.size_bytes -= old.size;
        }
        self.size_bytes += size;
    }

    /// Evict LRU entries other than `keep` until `size_bytes <= target`.
    fn evict_to(&mut self, target: u64, keep: &MeshKey) {
        let mut candidates: Vec<(u64, MeshKey)> = self
            .entries
            .iter()
            .filter(|(key, _)| *key != keep)
            .map(|(key, entry)| (entry.last_used, *key))
            .collect();
        candidates.sort_unstable();

        for (_, key) in candidates {
            if self.size_bytes <= target {
                break;
            }
            if let Some(entry) = self.entries.remove(&key) {
                self.size_bytes -= entry.size;
                self.evictions += 1;
                tracing::debug!(%key, bytes = entry.size, "evicted cached mesh");
            }
        }
    }
}

/// Thread-safe LRU cache of canonical meshes with a byte ceiling.
///
/// All bookkeeping sits behind one mutex, so concurrent `get`/`put` and
/// eviction on the same key are serialized.
#[derive(Debug)]
pub struct GeometryCache {
    inner: Mutex<CacheInner>,
    capacity: u64,
    low_water: u64,
}

impl Default for GeometryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY_BYTES)
    }
}

impl GeometryCache {
    /// A cache holding up to `capacity_bytes`, shrinking to 85% when exceeded.
    pub fn new(capacity_bytes: u64) -> Self {
        Self::with_low_water(capacity_bytes, DEFAULT_LOW_WATER_RATIO)
    }

    /// A cache with an explicit low-water ratio, clamped to `0.0..=1.0`.
    pub fn with_low_water(capacity_bytes: u64, ratio: f64) -> Self {
        let ratio = if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            DEFAULT_LOW_WATER_RATIO
        };
        Self {
            inner: Mutex::new(CacheInner::default()),
            capacity: capacity_bytes,
            low_water: (capacity_bytes as f64 * ratio) as u64,
        }
    }

    /// A cache sized by the `[cache]` config section.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::with_low_water(config.capacity_bytes, config.low_water_ratio)
    }

    /// The process-wide cache, created with the default capacity on first use.
    pub fn shared() -> Arc<GeometryCache> {
        Self::shared_with_capacity(DEFAULT_CAPACITY_BYTES)
    }

    /// The process-wide cache. `capacity_bytes` only takes effect if this call
    /// creates it.
    pub fn shared_with_capacity(capacity_bytes: u64) -> Arc<GeometryCache> {
        Self::shared_or_init(|| GeometryCache::new(capacity_bytes))
    }

    /// The process-wide cache, sized from `config` if this call creates it.
    pub fn shared_from_config(config: &CacheConfig) -> Arc<GeometryCache> {
        Self::shared_or_init(|| GeometryCache::from_config(config))
    }

    fn shared_or_init(init: impl FnOnce() -> GeometryCache) -> Arc<GeometryCache> {
        Arc::clone(SHARED.get_or_init(|| {
            let cache = init();
            tracing::debug!(
                capacity_bytes = cache.capacity,
                low_water = cache.low_water,
                "creating shared geometry cache"
            );
            Arc::new(cache)
        }))
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // Entries are immutable and the counters are plain integers, so a
        // panic while holding the lock leaves nothing half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a mesh, marking it most recently used.
    pub fn get(&self, key: &MeshKey) -> Option<Arc<CachedMesh>> {
        self.lock().lookup(key)
    }

    /// Store a mesh under `key`, replacing any previous entry, and evict if
    /// the cache is now over capacity. The inserted entry is never evicted by
    /// its own insertion.
    pub fn put(&self, key: MeshKey, mesh: CachedMesh) -> Arc<CachedMesh> {
        let mesh = Arc::new(mesh);
        let mut inner = self.lock();
        inner.insert(key, Arc::clone(&mesh));
        if inner.size_bytes > self.capacity {
            inner.evict_to(self.low_water, &key);
        }
        mesh
    }

    /// Return the cached mesh for `key`, building and storing it on a miss.
    ///
    /// The lock is held while `build` runs, so each key is built at most once
    /// even with concurrent callers.
    pub fn get_or_build<F>(&self, key: MeshKey, build: F) -> Arc<CachedMesh>
    where
        F: FnOnce(&MeshKey) -> CachedMesh,
    {
        let mut inner = self.lock();
        if let Some(mesh) = inner.lookup(&key) {
            return mesh;
        }

        let mesh = Arc::new(build(&key));
        inner.builds += 1;
        tracing::debug!(
            %key,
            bytes = mesh.size_in_bytes(),
            vertices = mesh.vertex_count(),
            "built mesh on cache miss"
        );
        inner.insert(key, Arc::clone(&mesh));
        if inner.size_bytes > self.capacity {
            inner.evict_to(self.low_water, &key);
        }
        mesh
    }

    /// [`get_or_build`](Self::get_or_build) with the standard tessellator.
    pub fn get_or_tessellate(&self, key: MeshKey) -> Arc<CachedMesh> {
        self.get_or_build(key, |key| tessellate(*key))
    }

    /// Returns `true` if `key` is resident. Does not affect recency.
    pub fn contains(&self, key: &MeshKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Drop one entry. Meshes already handed out stay alive through their `Arc`.
    pub fn remove(&self, key: &MeshKey) -> Option<Arc<CachedMesh>> {
        let mut inner = self.lock();
        let entry = inner.entries.remove(key)?;
        inner.size_bytes -= entry.size;
        Some(entry.mesh)
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        *self.lock() = CacheInner::default();
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            builds: inner.builds,
            evictions: inner.evictions,
            size_bytes: inner.size_bytes,
            entries: inner.entries.len(),
        }
    }

    /// Byte ceiling that triggers eviction.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Size eviction shrinks the cache down to.
    pub fn low_water(&self) -> u64 {
        self.low_water
    }

    /// Bytes currently tracked.
    pub fn size_bytes(&self) -> u64 {
        self.lock().size_bytes
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
