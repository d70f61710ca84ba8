use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use murmur_types::SearchHit;
use serde::Deserialize;

use super::extract::optional_user;
use super::ApiResult;
use crate::db::repositories::SearchRepository;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /search?q= - Relevance-ranked post search
pub async fn search_posts(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<SearchHit>>> {
    let viewer = optional_user(&state, &headers)?;

    let hits = SearchRepository::new(state.db.pool.clone()).posts(&query.q, viewer)?;
    Ok(Json(hits))
}
