use crate::cache::Cached;
use crate::error::{Result, ShortstackError};
use crate::facets::{censor, count_facets, FacetFilters};
use crate::index::{IndexAccessor, LoadedIndex};
use crate::types::{FacetCounts, Hit};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// The full argument tuple of one worker call.
///
/// Field order is the serialization order, which makes it the cache key
/// order as well.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerQuery {
    pub query: String,
    pub facet: Option<String>,
    pub facet_filters: serde_json::Value,
    pub page: usize,
    pub hits_per_page: usize,
}

/// One page of filtered hits plus the censored facet tables of the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerResult {
    pub hits: Vec<Hit>,
    pub facets: FacetCounts,
    /// Number of hits left after facet filtering, before pagination.
    pub total: usize,
    pub page_size: usize,
    pub page: usize,
}

/// Answers queries against one named index.
#[async_trait]
pub trait SearchWorker: Send + Sync {
    async fn search(&self, query: &WorkerQuery) -> Result<Arc<WorkerResult>>;
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Percentage of the corpus size a facet table may reach before it is hidden.
    pub censor_threshold: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        WorkerConfig {
            censor_threshold: 100,
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        WorkerConfig {
            censor_threshold: std::env::var("SHORTSTACK_CENSOR_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
        }
    }

    pub fn with_censor_threshold(censor_threshold: u32) -> Self {
        WorkerConfig { censor_threshold }
    }
}

/// Worker over a lazily loaded local index.
///
/// Facets are counted over every text match, before facet filters apply,
/// so refining one value does not hide the others.
pub struct LocalWorker {
    accessor: IndexAccessor,
    config: WorkerConfig,
}

impl LocalWorker {
    pub fn new(accessor: IndexAccessor, config: WorkerConfig) -> Self {
        LocalWorker { accessor, config }
    }

    /// Wrap this worker in a per-instance result cache.
    pub fn cached(self) -> Cached<Self> {
        Cached::new(self)
    }

    pub fn accessor(&self) -> &IndexAccessor {
        &self.accessor
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }
}

#[async_trait]
impl SearchWorker for LocalWorker {
    async fn search(&self, query: &WorkerQuery) -> Result<Arc<WorkerResult>> {
        let loaded = self.accessor.get().await?;
        let query = query.clone();
        let threshold = self.config.censor_threshold;
        let result = tokio::task::spawn_blocking(move || execute(&loaded, &query, threshold))
            .await
            .map_err(|e| ShortstackError::Internal(format!("Search task failed: {}", e)))??;
        Ok(Arc::new(result))
    }
}

fn execute(loaded: &LoadedIndex, query: &WorkerQuery, censor_threshold: u32) -> Result<WorkerResult> {
    let reference_field = &loaded.mapping().reference_field;
    let hits: Vec<Hit> = loaded
        .index()
        .search(&query.query)?
        .into_iter()
        .filter_map(|m| {
            let doc = loaded.corpus().get(&m.reference)?;
            Some(Hit::new(m.reference, m.score, doc))
        })
        .collect();

    let filters = FacetFilters::from_value(&query.facet_filters);
    let facets = censor(
        count_facets(&hits, reference_field),
        censor_threshold,
        loaded.document_count(),
        query.facet.as_deref(),
        &filters,
    );

    let hits = filters.apply(hits);
    let total = hits.len();
    let start = query.page.saturating_mul(query.hits_per_page);
    let page_hits = hits
        .into_iter()
        .skip(start)
        .take(query.hits_per_page)
        .collect();

    tracing::debug!(
        query = %query.query,
        total,
        facets = facets.len(),
        page = query.page,
        "Worker query"
    );

    Ok(WorkerResult {
        hits: page_hits,
        facets,
        total,
        page_size: query.hits_per_page,
        page: query.page,
    })
}
