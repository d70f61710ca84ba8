use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use murmur_types::{FollowOutcome, FollowStatusResponse, OkResponse, RemoveFollowerResponse};

use super::extract::require_user;
use super::ApiResult;
use crate::db::repositories::FollowRepository;
use crate::state::AppState;

/// POST /follow/:username
///
/// 201 when a new edge is created, 200 when it already existed.
pub async fn follow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> ApiResult<(StatusCode, Json<OkResponse>)> {
    let user_id = require_user(&state, &headers)?;

    let outcome = FollowRepository::new(state.db.pool.clone()).follow(user_id, &username)?;
    let status = match outcome {
        FollowOutcome::Created => {
            tracing::debug!(user_id, target = %username, "Followed user");
            StatusCode::CREATED
        }
        FollowOutcome::AlreadyFollowing => StatusCode::OK,
    };

    Ok((status, Json(OkResponse { ok: true })))
}

/// DELETE /follow/:username
pub async fn unfollow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<OkResponse>> {
    let user_id = require_user(&state, &headers)?;

    FollowRepository::new(state.db.pool.clone()).unfollow(user_id, &username)?;
    Ok(Json(OkResponse { ok: true }))
}

/// GET /follow/:username/status
pub async fn follow_status(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<FollowStatusResponse>> {
    let user_id = require_user(&state, &headers)?;

    let following = FollowRepository::new(state.db.pool.clone()).is_following(user_id, &username)?;
    Ok(Json(FollowStatusResponse { following }))
}

/// DELETE /followers/:username - Make someone stop following me
pub async fn remove_follower(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<RemoveFollowerResponse>> {
    let user_id = require_user(&state, &headers)?;

    let removed = FollowRepository::new(state.db.pool.clone()).remove_follower(user_id, &username)?;
    Ok(Json(RemoveFollowerResponse { ok: true, removed }))
}
