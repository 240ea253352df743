use crate::types::{FacetCounts, Hit};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HitsResponse {
    pub hits: Vec<Hit>,
    pub query: String,
    /// The query, URL-encoded.
    pub params: String,
    pub facets: FacetCounts,
    pub rendering_content: RenderingContent,
    pub page: usize,
    pub nb_hits: usize,
    pub nb_pages: usize,
    pub hits_per_page: usize,
    #[serde(rename = "processingTimeMS")]
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderingContent {
    pub facet_ordering: FacetOrdering,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetOrdering {
    pub facets: FacetOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetOrder {
    pub order: Vec<String>,
}

impl RenderingContent {
    pub fn from_facets(facets: &FacetCounts) -> Self {
        RenderingContent {
            facet_ordering: FacetOrdering {
                facets: FacetOrder {
                    order: facets.keys().cloned().collect(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetHit {
    pub value: String,
    pub highlighted: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetValuesResponse {
    pub facet_hits: Vec<FacetHit>,
    pub exhaustive_facets_count: bool,
    #[serde(rename = "processingTimeMS")]
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SearchResult {
    Facets(FacetValuesResponse),
    Hits(HitsResponse),
}

impl SearchResult {
    pub fn as_hits(&self) -> Option<&HitsResponse> {
        match self {
            SearchResult::Hits(r) => Some(r),
            SearchResult::Facets(_) => None,
        }
    }

    pub fn as_facets(&self) -> Option<&FacetValuesResponse> {
        match self {
            SearchResult::Facets(r) => Some(r),
            SearchResult::Hits(_) => None,
        }
    }
}

/// Facet-query results first, then hit-query results, each in request order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponses {
    pub results: Vec<SearchResult>,
}
