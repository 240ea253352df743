//! # Shortstack
//!
//! Serves the InstantSearch (Algolia multi-query) protocol from a local,
//! in-memory full-text index. Built on [Tantivy](https://github.com/quickwit-oss/tantivy).
//!
//! The crate is the aggregation layer between raw index lookups and the UI
//! protocol: per-query routing across named indexes, facet counting and
//! filtering, suppression of high-cardinality facets, pagination, and a
//! per-query result cache. The companion `shortstack-http` crate exposes it
//! over HTTP.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use shortstack::SearchClient;
//! use serde_json::json;
//!
//! # async fn run() -> shortstack::Result<()> {
//! // Loaded on first query, from a path or an http(s) URL
//! let client = SearchClient::from_resource("search_index.json");
//!
//! let responses = client
//!     .search(&json!([
//!         {"indexName": "docs", "params": {"query": "pancakes", "hitsPerPage": 5}},
//!         {"indexName": "docs", "type": "facet", "facet": "category",
//!          "params": {"query": "pancakes", "facetQuery": "break"}}
//!     ]))
//!     .await?;
//! assert_eq!(responses.results.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Multiple indexes
//!
//! ```rust,no_run
//! use indexmap::IndexMap;
//! use shortstack::index::source::{ResourceSource, StaticSource};
//! use shortstack::{ClientConfig, IndexAccessor, LocalWorker, SearchClient, SearchWorker, WorkerConfig};
//! use std::sync::Arc;
//!
//! # fn main() -> shortstack::Result<()> {
//! let fallback = StaticSource::from_json(
//!     "bundled",
//!     r#"{"documents": [], "mapping": {"ref": "id", "fields": ["title"]}}"#,
//! )?;
//! let recipes = LocalWorker::new(
//!     IndexAccessor::new(ResourceSource::new("https://example.com/recipes.json"))
//!         .with_fallback(fallback),
//!     WorkerConfig::from_env(),
//! )
//! .cached();
//!
//! let mut workers: IndexMap<String, Arc<dyn SearchWorker>> = IndexMap::new();
//! workers.insert("recipes".to_string(), Arc::new(recipes));
//! let client = SearchClient::new(workers, ClientConfig::from_env())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Dependencies | Use case |
//! |---------|-------------|----------|
//! | `axum-support` | axum | [`ShortstackError`] implements `IntoResponse` |

pub mod cache;
pub mod client;
pub mod error;
pub mod facets;
pub mod index;
pub mod types;
pub mod worker;

pub use cache::{Cached, ResultCache};
pub use client::{ClientConfig, SearchClient, SearchResponses, SearchResult, UnknownIndexPolicy};
pub use error::{Result, ShortstackError};
pub use index::{IndexAccessor, LexicalIndex, LoadedIndex};
pub use types::*;
pub use worker::{LocalWorker, SearchWorker, WorkerConfig, WorkerQuery, WorkerResult};
