use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use murmur_types::{
    InsertedResponse, MeResponse, OkResponse, PostView, SigninRequest, SigninResponse,
    SignupRequest,
};

use super::extract::{clear_session_cookie, require_user, session_cookie, session_token};
use super::{ApiError, ApiResult};
use crate::db::repositories::{PostRepository, UserRepository};
use crate::password::{hash_password, verify_password};
use crate::state::AppState;

/// POST /signup - Create an account
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<InsertedResponse>)> {
    let Json(payload) = payload?;
    let username = payload.username.trim();

    if username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "username and password are required".to_string(),
        ));
    }
    if state.filter.is_profane(username) {
        return Err(ApiError::BadRequest(
            "Inappropriate username. Please choose another.".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password)?;
    let user_id = UserRepository::new(state.db.pool.clone()).create(username, &password_hash)?;

    tracing::info!(user_id, username, "User signed up");
    Ok((
        StatusCode::CREATED,
        Json(InsertedResponse {
            inserted_id: user_id,
        }),
    ))
}

/// POST /signin - Exchange credentials for a session
pub async fn signin(
    State(state): State<AppState>,
    payload: Result<Json<SigninRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = payload?;
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "username and password are required".to_string(),
        ));
    }

    let invalid = || ApiError::Unauthorized("Invalid username or password".to_string());

    let (user, password_hash) = UserRepository::new(state.db.pool.clone())
        .get_credentials(&payload.username)?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &password_hash)? {
        tracing::debug!(user_id = user.id, "Rejected sign-in with wrong password");
        return Err(invalid());
    }

    let session_token = state.session_manager.create_session(user.id)?;
    let cookie = session_cookie(
        &state.auth,
        &session_token,
        state.session_manager.ttl().num_seconds(),
    );

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(SigninResponse {
            user_id: user.id,
            username: user.username,
            session_token,
        }),
    ))
}

/// POST /logout - Drop the presented session, if any
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    if let Some(token) = session_token(&headers, &state.auth.cookie_name) {
        state.session_manager.delete_session(&token)?;
    }

    Ok((
        [(header::SET_COOKIE, clear_session_cookie(&state.auth))],
        Json(OkResponse { ok: true }),
    ))
}

/// GET /me - Who the session belongs to
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<MeResponse>> {
    let user_id = require_user(&state, &headers)?;

    let user = UserRepository::new(state.db.pool.clone())
        .get_by_id(user_id)?
        .ok_or_else(|| ApiError::Unauthorized("Session user no longer exists".to_string()))?;

    Ok(Json(MeResponse {
        user_id: user.id,
        username: user.username,
    }))
}

/// GET /me/posts - The requester's own posts
pub async fn my_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<PostView>>> {
    let user_id = require_user(&state, &headers)?;

    let posts = PostRepository::new(state.db.pool.clone()).list_by_author(user_id, Some(user_id))?;
    Ok(Json(posts))
}
