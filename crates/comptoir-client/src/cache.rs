use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// Standard collection envelope returned by the backend's list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// Wraps a bare array the way some endpoints return one.
    pub fn from_results(results: Vec<T>) -> Self {
        Self {
            count: results.len() as u64,
            next: None,
            previous: None,
            results,
        }
    }
}

/// List-query parameters shared by every collection endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub extra: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn ordering(mut self, ordering: impl Into<String>) -> Self {
        self.ordering = Some(ordering.into());
        self
    }

    /// Adds an entity-specific filter such as `warehouse` or `start_date`.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.extra.push((key.into(), value.to_string()));
        self
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("page_size".to_string(), page_size.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search".to_string(), search.clone()));
        }
        if let Some(ordering) = &self.ordering {
            pairs.push(("ordering".to_string(), ordering.clone()));
        }
        pairs.extend(self.extra.iter().cloned());
        pairs
    }

    /// Canonical key this query's page is cached under.
    pub fn cache_key(&self) -> String {
        self.to_query()
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// A cached record must expose the identifier mutations match on.
pub trait Record: Clone {
    fn record_id(&self) -> i64;
}

#[derive(Debug, Clone)]
struct PageEntry<T> {
    page: Paginated<T>,
    stale: bool,
}

struct CacheInner<T> {
    pages: HashMap<String, PageEntry<T>>,
    details: HashMap<i64, T>,
}

/// Client-side copy of one entity collection: list pages keyed by query
/// parameters plus a detail map, with staleness tracking.
///
/// All patches happen synchronously under the lock, so a mutation is fully
/// visible before the network call it anticipates is even dispatched.
pub struct CollectionCache<T> {
    inner: Mutex<CacheInner<T>>,
    next_provisional: AtomicI64,
}

impl<T: Record> CollectionCache<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                pages: HashMap::new(),
                details: HashMap::new(),
            }),
            next_provisional: AtomicI64::new(-1),
        }
    }

    /// Allocates a placeholder identifier. Strictly decreasing negatives:
    /// distinct from every server-assigned id and from each other no matter
    /// how quickly callers allocate.
    pub fn provisional_id(&self) -> i64 {
        self.next_provisional.fetch_sub(1, Ordering::Relaxed)
    }

    pub fn store_page(&self, key: &str, page: Paginated<T>) {
        let mut inner = self.inner.lock();
        inner.pages.insert(key.to_string(), PageEntry { page, stale: false });
    }

    /// The cached page for this key, only if it has not been invalidated.
    pub fn fresh_page(&self, key: &str) -> Option<Paginated<T>> {
        let inner = self.inner.lock();
        inner
            .pages
            .get(key)
            .filter(|entry| !entry.stale)
            .map(|entry| entry.page.clone())
    }

    /// The cached page regardless of staleness.
    pub fn page(&self, key: &str) -> Option<Paginated<T>> {
        let inner = self.inner.lock();
        inner.pages.get(key).map(|entry| entry.page.clone())
    }

    pub fn store_detail(&self, id: i64, entity: T) {
        self.inner.lock().details.insert(id, entity);
    }

    pub fn detail(&self, id: i64) -> Option<T> {
        self.inner.lock().details.get(&id).cloned()
    }

    /// Flags every cached page for refetch.
    pub fn invalidate(&self) {
        let mut inner = self.inner.lock();
        for entry in inner.pages.values_mut() {
            entry.stale = true;
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.pages.clear();
        inner.details.clear();
    }

    /// Replaces the record in place on every cached page and overwrites the
    /// detail entry, then flags the collection for refetch. Used to absorb
    /// the authoritative result of a non-optimistic update.
    pub fn absorb(&self, id: i64, entity: T) {
        let mut inner = self.inner.lock();
        for entry in inner.pages.values_mut() {
            for slot in entry.page.results.iter_mut() {
                if slot.record_id() == id {
                    *slot = entity.clone();
                }
            }
            entry.stale = true;
        }
        inner.details.insert(entity.record_id(), entity);
    }

    /// Phase one of an optimistic create: snapshot every cached page, then
    /// insert the provisional record at the head of each with its count
    /// bumped. The returned mutation must be settled with `commit` or
    /// `rollback`.
    pub fn begin_insert(&self, provisional: T) -> OptimisticInsert<'_, T> {
        let mut inner = self.inner.lock();
        let snapshot = inner.pages.clone();
        let provisional_id = provisional.record_id();
        for entry in inner.pages.values_mut() {
            entry.page.results.insert(0, provisional.clone());
            entry.page.count += 1;
        }
        OptimisticInsert {
            cache: self,
            snapshot,
            provisional_id,
        }
    }

    /// Phase one of an optimistic delete: snapshot, then drop the record
    /// from every cached page with its count decremented.
    pub fn begin_remove(&self, id: i64) -> OptimisticRemove<'_, T> {
        let mut inner = self.inner.lock();
        let snapshot = inner.pages.clone();
        for entry in inner.pages.values_mut() {
            entry.page.results.retain(|record| record.record_id() != id);
            entry.page.count = entry.page.count.saturating_sub(1);
        }
        OptimisticRemove {
            cache: self,
            snapshot,
            removed_id: id,
        }
    }

    fn restore(&self, snapshot: HashMap<String, PageEntry<T>>) {
        let mut inner = self.inner.lock();
        inner.pages = snapshot;
        for entry in inner.pages.values_mut() {
            entry.stale = true;
        }
    }
}

impl<T: Record> Default for CollectionCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// In-flight optimistic create. Settling either way leaves every cached
/// page flagged for refetch, so provisional data never outlives one round
/// trip as the visible truth.
#[must_use = "an optimistic insert must be committed or rolled back"]
pub struct OptimisticInsert<'a, T: Record> {
    cache: &'a CollectionCache<T>,
    snapshot: HashMap<String, PageEntry<T>>,
    provisional_id: i64,
}

impl<'a, T: Record> OptimisticInsert<'a, T> {
    pub fn provisional_id(&self) -> i64 {
        self.provisional_id
    }

    /// Swaps the provisional record for the authoritative one, keeping its
    /// list position.
    pub fn commit(self, entity: T) {
        let mut inner = self.cache.inner.lock();
        for entry in inner.pages.values_mut() {
            for slot in entry.page.results.iter_mut() {
                if slot.record_id() == self.provisional_id {
                    *slot = entity.clone();
                }
            }
            entry.stale = true;
        }
        inner.details.insert(entity.record_id(), entity);
    }

    /// Restores the exact pre-mutation snapshot.
    pub fn rollback(self) {
        self.cache.restore(self.snapshot);
    }
}

#[must_use = "an optimistic remove must be committed or rolled back"]
pub struct OptimisticRemove<'a, T: Record> {
    cache: &'a CollectionCache<T>,
    snapshot: HashMap<String, PageEntry<T>>,
    removed_id: i64,
}

impl<'a, T: Record> OptimisticRemove<'a, T> {
    pub fn commit(self) {
        let mut inner = self.cache.inner.lock();
        inner.details.remove(&self.removed_id);
        for entry in inner.pages.values_mut() {
            entry.stale = true;
        }
    }

    pub fn rollback(self) {
        self.cache.restore(self.snapshot);
    }
}
