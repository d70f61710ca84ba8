use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use murmur_types::{PostView, UserProfile, UserSummary};

use super::extract::optional_user;
use super::search::SearchQuery;
use super::ApiResult;
use crate::db::repositories::{FollowRepository, PostRepository, SearchRepository, UserRepository};
use crate::state::AppState;

/// GET /users/search?q= - Username search
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let users = SearchRepository::new(state.db.pool.clone()).users(&query.q)?;
    Ok(Json(users))
}

/// GET /users/:username - Public profile
pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    let profile = UserRepository::new(state.db.pool.clone()).profile(&username)?;
    Ok(Json(profile))
}

/// GET /users/:username/posts
pub async fn user_posts(
    State(state): State<AppState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<PostView>>> {
    let viewer = optional_user(&state, &headers)?;
    let user = UserRepository::new(state.db.pool.clone()).require_by_username(&username)?;

    let posts = PostRepository::new(state.db.pool.clone()).list_by_author(user.id, viewer)?;
    Ok(Json(posts))
}

/// GET /users/:username/followers
pub async fn list_followers(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let followers = FollowRepository::new(state.db.pool.clone()).list_followers(&username)?;
    Ok(Json(followers))
}

/// GET /users/:username/following
pub async fn list_following(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let following = FollowRepository::new(state.db.pool.clone()).list_following(&username)?;
    Ok(Json(following))
}
