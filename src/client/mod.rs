pub mod request;
pub mod response;

use crate::error::{Result, ShortstackError};
use crate::index::source::ResourceSource;
use crate::index::IndexAccessor;
use crate::types::FacetCounts;
use crate::worker::{LocalWorker, SearchWorker, WorkerConfig, WorkerQuery};
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use std::time::Instant;

pub use request::{parse_batch, FacetQuery, HitQuery, SearchRequestItem, DEFAULT_HITS_PER_PAGE};
pub use response::{
    FacetHit, FacetValuesResponse, HitsResponse, RenderingContent, SearchResponses, SearchResult,
};

/// Page size used for facet-queries, whose hits are discarded.
const FACET_QUERY_PAGE_SIZE: usize = 20;

/// What to do with a query naming an index that is not registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownIndexPolicy {
    /// Route it to the first registered worker.
    #[default]
    FirstRegistered,
    /// Fail the batch with [`ShortstackError::IndexNotFound`].
    Reject,
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub unknown_index: UnknownIndexPolicy,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let reject = std::env::var("SHORTSTACK_REJECT_UNKNOWN_INDEX")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        ClientConfig {
            unknown_index: if reject {
                UnknownIndexPolicy::Reject
            } else {
                UnknownIndexPolicy::FirstRegistered
            },
        }
    }
}

/// Routes batched InstantSearch queries to per-index workers.
///
/// Every query of a batch runs concurrently. Results come back as two
/// runs, facet-queries first and hit-queries second, each in the order
/// the queries were given.
///
/// # Examples
///
/// ```rust,no_run
/// use shortstack::SearchClient;
/// use serde_json::json;
///
/// # async fn run() -> shortstack::Result<()> {
/// let client = SearchClient::from_resource("search_index.json");
/// let responses = client
///     .search(&json!([{"indexName": "docs", "params": {"query": "pancakes"}}]))
///     .await?;
/// println!("{}", serde_json::to_string(&responses)?);
/// # Ok(())
/// # }
/// ```
pub struct SearchClient {
    workers: IndexMap<String, Arc<dyn SearchWorker>>,
    config: ClientConfig,
}

impl SearchClient {
    /// The first entry of `workers` is the default for unknown index names.
    pub fn new(workers: IndexMap<String, Arc<dyn SearchWorker>>, config: ClientConfig) -> Result<Self> {
        if workers.is_empty() {
            return Err(ShortstackError::Config(
                "at least one index worker is required".to_string(),
            ));
        }
        Ok(SearchClient { workers, config })
    }

    /// One cached worker over the bundle at `location`, hiding facet tables
    /// larger than 80% of the corpus.
    pub fn from_resource(location: impl Into<String>) -> Self {
        let location = location.into();
        let worker = LocalWorker::new(
            IndexAccessor::new(ResourceSource::new(location.clone())),
            WorkerConfig::with_censor_threshold(80),
        )
        .cached();
        let mut workers: IndexMap<String, Arc<dyn SearchWorker>> = IndexMap::new();
        workers.insert(location, Arc::new(worker));
        SearchClient {
            workers,
            config: ClientConfig::default(),
        }
    }

    pub fn index_names(&self) -> impl Iterator<Item = &str> {
        self.workers.keys().map(String::as_str)
    }

    fn resolve(&self, index_name: &str) -> Result<Arc<dyn SearchWorker>> {
        if let Some(worker) = self.workers.get(index_name) {
            return Ok(Arc::clone(worker));
        }
        match self.config.unknown_index {
            UnknownIndexPolicy::Reject => Err(ShortstackError::IndexNotFound(index_name.to_string())),
            UnknownIndexPolicy::FirstRegistered => {
                let (default_name, worker) = self.workers.first().ok_or_else(|| {
                    ShortstackError::Config("no index workers registered".to_string())
                })?;
                tracing::debug!(
                    requested = index_name,
                    routed_to = %default_name,
                    "Unknown index, using default worker"
                );
                Ok(Arc::clone(worker))
            }
        }
    }

    /// Answer a batch given as a JSON array of query objects.
    ///
    /// Any other shape fails with [`ShortstackError::UnsupportedRequestShape`]
    /// before a single query runs. If queries fail, every query still
    /// settles and the error of the earliest failing query is returned.
    pub async fn search(&self, batch: &serde_json::Value) -> Result<SearchResponses> {
        let items = parse_batch(batch)?;
        self.search_items(items).await
    }

    pub async fn search_items(&self, items: Vec<SearchRequestItem>) -> Result<SearchResponses> {
        let start = Instant::now();
        let routed = items
            .into_iter()
            .map(|item| Ok((self.resolve(item.index_name())?, item)))
            .collect::<Result<Vec<_>>>()?;
        let batch_size = routed.len();

        // Handles are awaited in input order; a panicked task still lets its
        // siblings run to completion.
        let handles: Vec<_> = routed
            .into_iter()
            .map(|(worker, item)| {
                tokio::spawn(async move { run_item(worker.as_ref(), item).await })
            })
            .collect();

        let mut settled: Vec<Result<SearchResult>> = Vec::with_capacity(batch_size);
        for handle in handles {
            settled.push(match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(ShortstackError::Internal(format!("Query task failed: {}", e))),
            });
        }

        let mut facet_results = Vec::new();
        let mut hit_results = Vec::new();
        for outcome in settled {
            match outcome? {
                result @ SearchResult::Facets(_) => facet_results.push(result),
                result @ SearchResult::Hits(_) => hit_results.push(result),
            }
        }
        facet_results.extend(hit_results);

        tracing::debug!(
            queries = batch_size,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Batch answered"
        );
        Ok(SearchResponses {
            results: facet_results,
        })
    }
}

async fn run_item(worker: &dyn SearchWorker, item: SearchRequestItem) -> Result<SearchResult> {
    let start = Instant::now();
    match item {
        SearchRequestItem::Hits(q) => {
            let result = worker
                .search(&WorkerQuery {
                    query: q.query.clone(),
                    facet: q.facet.clone(),
                    facet_filters: q.facet_filters.clone(),
                    page: q.page,
                    hits_per_page: q.hits_per_page,
                })
                .await?;
            let nb_pages = if result.page_size == 0 {
                0
            } else {
                result.total.div_ceil(result.page_size)
            };
            Ok(SearchResult::Hits(HitsResponse {
                hits: result.hits.clone(),
                params: urlencoding::encode(&q.query).into_owned(),
                query: q.query,
                facets: result.facets.clone(),
                rendering_content: RenderingContent::from_facets(&result.facets),
                page: result.page,
                nb_hits: result.total,
                nb_pages,
                hits_per_page: result.page_size,
                processing_time_ms: start.elapsed().as_millis() as u64,
            }))
        }
        SearchRequestItem::Facets(q) => {
            let result = worker
                .search(&WorkerQuery {
                    query: q.query.clone(),
                    facet: q.facet.clone(),
                    facet_filters: q.facet_filters.clone(),
                    page: 0,
                    hits_per_page: FACET_QUERY_PAGE_SIZE,
                })
                .await?;
            let mut facet_hits =
                flatten_facets(&result.facets, q.facet_query.as_deref(), q.facet.as_deref());
            if let Some(max) = q.max_facet_hits {
                facet_hits.truncate(max);
            }
            Ok(SearchResult::Facets(FacetValuesResponse {
                facet_hits,
                exhaustive_facets_count: true,
                processing_time_ms: start.elapsed().as_millis() as u64,
            }))
        }
    }
}

/// Case-insensitive pattern; an invalid pattern is matched literally.
fn facet_query_matcher(pattern: &str) -> Option<Regex> {
    let build = |p: &str| RegexBuilder::new(p).case_insensitive(true).build();
    match build(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "Invalid facetQuery pattern, matching literally");
            build(&regex::escape(pattern)).ok()
        }
    }
}

/// Flatten facet tables into facet hits, keeping only `facet_name`'s table
/// (when given) and values matching `facet_query` (when given).
pub fn flatten_facets(
    facets: &FacetCounts,
    facet_query: Option<&str>,
    facet_name: Option<&str>,
) -> Vec<FacetHit> {
    let matcher = facet_query.and_then(facet_query_matcher);
    facets
        .iter()
        .filter(|(field, _)| facet_name.map_or(true, |name| name.is_empty() || name == *field))
        .flat_map(|(_, values)| values.iter())
        .filter(|(value, _)| matcher.as_ref().map_or(true, |re| re.is_match(value)))
        .map(|(value, &count)| FacetHit {
            value: value.clone(),
            highlighted: value.clone(),
            count,
        })
        .collect()
}
