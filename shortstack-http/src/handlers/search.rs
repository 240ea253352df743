use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use shortstack::client::{HitsResponse, SearchRequestItem};
use shortstack::{SearchResponses, SearchResult, ShortstackError};
use std::sync::Arc;

use super::AppState;

fn parse_body(body: &Bytes) -> Result<Value, ShortstackError> {
    if body.is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    // InstantSearch clients post JSON as text/plain, so the content type is not checked
    serde_json::from_slice(body)
        .map_err(|e| ShortstackError::UnsupportedRequestShape(format!("Invalid JSON: {}", e)))
}

/// Multi-query endpoint: `{"requests": [...]}` or a bare array of queries.
pub async fn batch_search(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SearchResponses>, ShortstackError> {
    let batch = match parse_body(&body)? {
        Value::Object(mut obj) => obj.remove("requests").unwrap_or(Value::Null),
        other => other,
    };
    let responses = state.client.search(&batch).await?;
    Ok(Json(responses))
}

/// Single hit-query against one index. The body is the query's params,
/// either directly or under a `params` key (object or URL-encoded string).
pub async fn search(
    State(state): State<Arc<AppState>>,
    Path(index_name): Path<String>,
    body: Bytes,
) -> Result<Json<HitsResponse>, ShortstackError> {
    let params = match parse_body(&body)? {
        Value::Object(mut obj) => match obj.remove("params") {
            Some(params) => params,
            None => Value::Object(obj),
        },
        _ => {
            return Err(ShortstackError::UnsupportedRequestShape(
                "expected a params object".to_string(),
            ))
        }
    };
    let item = SearchRequestItem::from_value(
        0,
        &serde_json::json!({"indexName": index_name, "params": params}),
    )?;

    let responses = state.client.search_items(vec![item]).await?;
    match responses.results.into_iter().next() {
        Some(SearchResult::Hits(hits)) => Ok(Json(hits)),
        _ => Err(ShortstackError::Internal(
            "single query produced no hit result".to_string(),
        )),
    }
}
