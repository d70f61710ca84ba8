use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use murmur_types::{
    CreateCommentRequest, CreatePostRequest, DeletedResponse, InsertedResponse, Post, PostDetail,
    PostView, UpdatePostRequest,
};

use super::extract::{optional_user, parse_post_id, require_user};
use super::{ApiError, ApiResult};
use crate::db::repositories::{CommentRepository, FeedRepository, PostRepository};
use crate::state::AppState;

/// GET /posts - Global feed
pub async fn global_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<PostView>>> {
    let viewer = optional_user(&state, &headers)?;

    let posts = FeedRepository::new(state.db.pool.clone()).global(viewer)?;
    Ok(Json(posts))
}

/// GET /followingposts - Posts by the requester and the people they follow
pub async fn following_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<PostView>>> {
    let user_id = require_user(&state, &headers)?;

    let posts = FeedRepository::new(state.db.pool.clone()).following(user_id)?;
    Ok(Json(posts))
}

/// POST /addpost - Create a post
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InsertedResponse>)> {
    let author_id = require_user(&state, &headers)?;
    let Json(payload) = payload?;

    let text = state.filter.censor(&payload.text);
    let post_id = PostRepository::new(state.db.pool.clone()).create(author_id, &text)?;

    tracing::debug!(post_id, author_id, "Created post");
    Ok((
        StatusCode::CREATED,
        Json(InsertedResponse {
            inserted_id: post_id,
        }),
    ))
}

/// POST /addcomment - Comment on a post
pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InsertedResponse>)> {
    let author_id = require_user(&state, &headers)?;
    let Json(payload) = payload?;

    let post_id = payload
        .post_id
        .filter(|_| !payload.text.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("comment information missing".to_string()))?;

    let text = state.filter.censor(&payload.text);
    let comment_id =
        CommentRepository::new(state.db.pool.clone()).create(author_id, post_id, &text)?;

    Ok((
        StatusCode::CREATED,
        Json(InsertedResponse {
            inserted_id: comment_id,
        }),
    ))
}

/// GET /posts/:id - A post with its comments
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<PostDetail>> {
    let post_id = parse_post_id(&post_id)?;
    let viewer = optional_user(&state, &headers)?;

    let post = PostRepository::new(state.db.pool.clone()).get_view(post_id, viewer)?;
    let comments = CommentRepository::new(state.db.pool.clone()).list_by_post(post_id)?;

    Ok(Json(PostDetail { post, comments }))
}

/// PATCH /posts/:id - Edit a post (author only)
pub async fn update_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> ApiResult<Json<Post>> {
    let post_id = parse_post_id(&post_id)?;
    let user_id = require_user(&state, &headers)?;
    let Json(payload) = payload?;

    let text = state.filter.censor(&payload.text);
    let post = PostRepository::new(state.db.pool.clone()).update(post_id, user_id, &text)?;

    tracing::debug!(post_id, "Edited post");
    Ok(Json(post))
}

/// DELETE /posts/:id - Delete a post (author only)
pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<DeletedResponse>> {
    let post_id = parse_post_id(&post_id)?;
    let user_id = require_user(&state, &headers)?;

    PostRepository::new(state.db.pool.clone()).delete(post_id, user_id)?;

    tracing::debug!(post_id, "Deleted post");
    Ok(Json(DeletedResponse {
        ok: true,
        deleted_id: post_id,
    }))
}
