use crate::error::Result;
use crate::worker::{SearchWorker, WorkerQuery, WorkerResult};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Serialize an argument tuple into a cache key.
///
/// Serialization is positional: struct fields in declaration order, JSON
/// objects in their own key order. Callers must build arguments
/// deterministically for equal queries to share a key.
pub fn cache_key<A: Serialize + ?Sized>(args: &A) -> Result<String> {
    Ok(serde_json::to_string(args)?)
}

/// Unbounded memo table with single-flight fills.
///
/// Concurrent callers with the same key wait on one computation. Errors are
/// not stored, so a failed key is recomputed on its next call.
pub struct ResultCache<V> {
    entries: DashMap<String, Arc<OnceCell<V>>>,
}

impl<V> Default for ResultCache<V> {
    fn default() -> Self {
        ResultCache {
            entries: DashMap::new(),
        }
    }
}

impl<V: Clone> ResultCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys holding a stored value.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.entries
            .get(key)
            .and_then(|cell| cell.get().cloned())
    }

    pub async fn get_or_try_insert<F, Fut>(&self, key: String, compute: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let cell = self.entries.entry(key).or_default().clone();
        if let Some(value) = cell.get() {
            tracing::trace!("[CACHE] HIT");
            return Ok(value.clone());
        }
        cell.get_or_try_init(compute).await.cloned()
    }
}

/// A [`SearchWorker`] that memoizes another worker's results per query.
///
/// The cache lives exactly as long as this wrapper: no eviction, no TTL.
pub struct Cached<W> {
    inner: W,
    cache: ResultCache<Arc<WorkerResult>>,
}

impl<W: SearchWorker> Cached<W> {
    pub fn new(inner: W) -> Self {
        Cached {
            inner,
            cache: ResultCache::new(),
        }
    }

    pub fn inner(&self) -> &W {
        &self.inner
    }

    pub fn cache(&self) -> &ResultCache<Arc<WorkerResult>> {
        &self.cache
    }
}

#[async_trait]
impl<W: SearchWorker> SearchWorker for Cached<W> {
    async fn search(&self, query: &WorkerQuery) -> Result<Arc<WorkerResult>> {
        let key = cache_key(query)?;
        self.cache
            .get_or_try_insert(key, || self.inner.search(query))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShortstackError;
    use crate::types::FacetCounts;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingWorker {
        calls: AtomicUsize,
        fail_first: bool,
    }

    impl CountingWorker {
        fn new() -> Self {
            CountingWorker {
                calls: AtomicUsize::new(0),
                fail_first: false,
            }
        }
    }

    #[async_trait]
    impl SearchWorker for CountingWorker {
        async fn search(&self, query: &WorkerQuery) -> Result<Arc<WorkerResult>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            if self.fail_first && call == 0 {
                return Err(ShortstackError::DataUnavailable("first call".into()));
            }
            Ok(Arc::new(WorkerResult {
                hits: Vec::new(),
                facets: FacetCounts::new(),
                total: call,
                page_size: query.hits_per_page,
                page: query.page,
            }))
        }
    }

    fn query(text: &str) -> WorkerQuery {
        WorkerQuery {
            query: text.to_string(),
            facet: None,
            facet_filters: json!([]),
            page: 0,
            hits_per_page: 20,
        }
    }

    #[test]
    fn test_key_is_positional() {
        let key = cache_key(&query("foo")).unwrap();
        assert_eq!(
            key,
            r#"{"query":"foo","facet":null,"facetFilters":[],"page":0,"hitsPerPage":20}"#
        );
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let cached = Cached::new(CountingWorker::new());
        let first = cached.search(&query("foo")).await.unwrap();
        let second = cached.search(&query("foo")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_arguments_are_distinct_entries() {
        let cached = Cached::new(CountingWorker::new());
        cached.search(&query("foo")).await.unwrap();
        let mut paged = query("foo");
        paged.page = 1;
        cached.search(&paged).await.unwrap();
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_compute_once() {
        let cached = Arc::new(Cached::new(CountingWorker::new()));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cached = Arc::clone(&cached);
            handles.push(tokio::spawn(async move {
                cached.search(&query("same")).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cached = Cached::new(CountingWorker {
            calls: AtomicUsize::new(0),
            fail_first: true,
        });
        assert!(cached.search(&query("foo")).await.is_err());
        assert!(cached.cache().is_empty());
        let result = cached.search(&query("foo")).await.unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }
}
