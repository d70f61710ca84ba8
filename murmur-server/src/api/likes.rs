use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use murmur_types::{LikeState, LikeStatus};

use super::extract::{optional_user, parse_post_id, require_user};
use super::ApiResult;
use crate::db::repositories::LikeRepository;
use crate::state::AppState;

/// GET /posts/:id/like - Like count, and whether the requester likes it
pub async fn like_status(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<LikeStatus>> {
    let post_id = parse_post_id(&post_id)?;
    let viewer = optional_user(&state, &headers)?;

    let status = LikeRepository::new(state.db.pool.clone()).status(viewer, post_id)?;
    Ok(Json(status))
}

/// POST /posts/:id/like
pub async fn like_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<LikeState>> {
    let post_id = parse_post_id(&post_id)?;
    let user_id = require_user(&state, &headers)?;

    let like = LikeRepository::new(state.db.pool.clone()).like(user_id, post_id)?;
    Ok(Json(like))
}

/// DELETE /posts/:id/like
pub async fn unlike_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<LikeState>> {
    let post_id = parse_post_id(&post_id)?;
    let user_id = require_user(&state, &headers)?;

    let like = LikeRepository::new(state.db.pool.clone()).unlike(user_id, post_id)?;
    Ok(Json(like))
}
