use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::trace;

use crate::form::{DirectoryEntry, DirectoryKey, LocationTriple};
use crate::{LOOKUP_CACHE_CAPACITY, LOOKUP_CACHE_TTL_MS};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Directory(DirectoryKey),
    Reverse(LocationTriple),
    Forward(String),
}

#[derive(Debug, Clone)]
enum CachedLookup {
    Directory(Vec<DirectoryEntry>),
    Reverse(Option<String>),
    Forward(Vec<LocationTriple>),
}

#[derive(Debug)]
struct Entry {
    stored_at_ms: u64,
    value: CachedLookup,
}

/// Recently answered reference lookups. Citizen lookups are never stored here.
#[derive(Debug)]
pub struct LookupCache {
    entries: LruCache<CacheKey, Entry>,
    ttl_ms: u64,
}

impl Default for LookupCache {
    fn default() -> Self {
        Self::new(LOOKUP_CACHE_CAPACITY, LOOKUP_CACHE_TTL_MS)
    }
}

impl LookupCache {
    pub fn new(capacity: usize, ttl_ms: u64) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl_ms,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn directory(&mut self, key: DirectoryKey, now_ms: u64) -> Option<Vec<DirectoryEntry>> {
        match self.fresh(&CacheKey::Directory(key), now_ms)? {
            CachedLookup::Directory(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn store_directory(&mut self, key: DirectoryKey, entries: Vec<DirectoryEntry>, now_ms: u64) {
        self.store(CacheKey::Directory(key), CachedLookup::Directory(entries), now_ms);
    }

    /// `Some(None)` is a cached "no postal code for this location".
    pub fn reverse_postal(&mut self, triple: LocationTriple, now_ms: u64) -> Option<Option<String>> {
        match self.fresh(&CacheKey::Reverse(triple), now_ms)? {
            CachedLookup::Reverse(code) => Some(code),
            _ => None,
        }
    }

    pub fn store_reverse_postal(&mut self, triple: LocationTriple, code: Option<String>, now_ms: u64) {
        self.store(CacheKey::Reverse(triple), CachedLookup::Reverse(code), now_ms);
    }

    pub fn forward_postal(&mut self, code: &str, now_ms: u64) -> Option<Vec<LocationTriple>> {
        match self.fresh(&CacheKey::Forward(code.to_string()), now_ms)? {
            CachedLookup::Forward(candidates) => Some(candidates),
            _ => None,
        }
    }

    pub fn store_forward_postal(&mut self, code: &str, candidates: Vec<LocationTriple>, now_ms: u64) {
        self.store(
            CacheKey::Forward(code.to_string()),
            CachedLookup::Forward(candidates),
            now_ms,
        );
    }

    fn fresh(&mut self, key: &CacheKey, now_ms: u64) -> Option<CachedLookup> {
        let expired = match self.entries.get(key) {
            Some(entry) => now_ms.saturating_sub(entry.stored_at_ms) >= self.ttl_ms,
            None => return None,
        };

        if expired {
            trace!(?key, "lookup cache entry expired");
            self.entries.pop(key);
            return None;
        }

        self.entries.peek(key).map(|entry| entry.value.clone())
    }

    fn store(&mut self, key: CacheKey, value: CachedLookup, now_ms: u64) {
        self.entries.put(
            key,
            Entry {
                stored_at_ms: now_ms,
                value,
            },
        );
    }
}
