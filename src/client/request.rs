use crate::error::{Result, ShortstackError};
use crate::types::scalar_to_string;
use serde_json::{Map, Value};

pub const DEFAULT_HITS_PER_PAGE: usize = 20;

/// Parameters carried JSON-encoded inside a URL-encoded `params` string.
const JSON_ENCODED_PARAMS: [&str; 2] = ["facetFilters", "facets"];

/// A hit-query: one page of matching documents plus facet tables.
#[derive(Debug, Clone, PartialEq)]
pub struct HitQuery {
    pub index_name: String,
    pub query: String,
    /// Restricts the facet tables to this one field.
    pub facet: Option<String>,
    pub facet_filters: Value,
    pub page: usize,
    pub hits_per_page: usize,
}

/// A facet-query: the values of one facet, optionally narrowed by a pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetQuery {
    pub index_name: String,
    pub query: String,
    pub facet: Option<String>,
    pub facet_query: Option<String>,
    pub facet_filters: Value,
    pub max_facet_hits: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchRequestItem {
    Hits(HitQuery),
    Facets(FacetQuery),
}

impl SearchRequestItem {
    pub fn index_name(&self) -> &str {
        match self {
            SearchRequestItem::Hits(q) => &q.index_name,
            SearchRequestItem::Facets(q) => &q.index_name,
        }
    }

    pub fn is_facet_query(&self) -> bool {
        matches!(self, SearchRequestItem::Facets(_))
    }

    /// Parse one entry of a batch. `position` is only used in error messages.
    pub fn from_value(position: usize, item: &Value) -> Result<Self> {
        let obj = item.as_object().ok_or_else(|| {
            ShortstackError::UnsupportedRequestShape(format!("query {} is not an object", position))
        })?;
        let params = match obj.get("params") {
            Some(Value::Object(params)) => params.clone(),
            Some(Value::String(encoded)) => decode_params(encoded),
            _ => {
                return Err(ShortstackError::UnsupportedRequestShape(format!(
                    "query {} has no params",
                    position
                )))
            }
        };

        let index_name = obj
            .get("indexName")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let facet = obj
            .get("facet")
            .and_then(Value::as_str)
            .filter(|f| !f.is_empty())
            .map(String::from);
        let is_facet_query = match obj.get("type").and_then(Value::as_str) {
            Some(kind) => kind == "facet",
            None => obj.contains_key("facet"),
        };

        let query = params
            .get("query")
            .and_then(scalar_to_string)
            .unwrap_or_default();
        let facet_filters = match params.get("facetFilters") {
            None | Some(Value::Null) => Value::Array(Vec::new()),
            Some(filters) => filters.clone(),
        };

        if is_facet_query {
            Ok(SearchRequestItem::Facets(FacetQuery {
                index_name,
                query,
                facet,
                facet_query: params
                    .get("facetQuery")
                    .and_then(Value::as_str)
                    .map(String::from),
                facet_filters,
                max_facet_hits: usize_param(params.get("maxFacetHits")),
            }))
        } else {
            Ok(SearchRequestItem::Hits(HitQuery {
                index_name,
                query,
                facet,
                facet_filters,
                page: usize_param(params.get("page")).unwrap_or(0),
                hits_per_page: usize_param(params.get("hitsPerPage"))
                    .filter(|&n| n > 0)
                    .unwrap_or(DEFAULT_HITS_PER_PAGE),
            }))
        }
    }
}

/// Parse a batch: a JSON array of query objects.
pub fn parse_batch(batch: &Value) -> Result<Vec<SearchRequestItem>> {
    let items = batch.as_array().ok_or_else(|| {
        ShortstackError::UnsupportedRequestShape("expected an array of queries".to_string())
    })?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| SearchRequestItem::from_value(i, item))
        .collect()
}

/// Decode an Algolia-style `params` string (`query=foo&hitsPerPage=5`).
pub fn decode_params(encoded: &str) -> Map<String, Value> {
    let mut params = Map::new();
    for (key, value) in url::form_urlencoded::parse(encoded.as_bytes()) {
        let value = if JSON_ENCODED_PARAMS.contains(&key.as_ref()) {
            serde_json::from_str(&value).unwrap_or_else(|_| Value::String(value.into_owned()))
        } else {
            Value::String(value.into_owned())
        };
        params.insert(key.into_owned(), value);
    }
    params
}

fn usize_param(value: Option<&Value>) -> Option<usize> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
