//! Request helpers shared by the handlers: session lookup, path ids, cookies.

use axum::http::{header, HeaderMap};

use super::{ApiError, ApiResult};
use crate::config::Auth;
use crate::state::AppState;

/// Lowercase so it can double as a `HeaderName`
pub const SESSION_HEADER: &str = "x-session-token";

/// Find the session token on a request
///
/// Checked in order: `X-Session-Token`, `Authorization: Bearer`, then the
/// session cookie.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(token) = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token.to_string());
    }

    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Authenticated user id, or 401
pub fn require_user(state: &AppState, headers: &HeaderMap) -> ApiResult<i64> {
    let token = session_token(headers, &state.auth.cookie_name)
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

    state
        .authenticated_user_id(&token)?
        .ok_or_else(|| ApiError::Unauthorized("Invalid session token".to_string()))
}

/// Authenticated user id if the request carries a valid session
pub fn optional_user(state: &AppState, headers: &HeaderMap) -> ApiResult<Option<i64>> {
    match session_token(headers, &state.auth.cookie_name) {
        Some(token) => Ok(state.authenticated_user_id(&token)?),
        None => Ok(None),
    }
}

pub fn parse_post_id(raw: &str) -> ApiResult<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::BadRequest("Invalid post id".to_string()))
}

/// `Set-Cookie` value carrying a fresh session
pub fn session_cookie(auth: &Auth, token: &str, max_age_secs: i64) -> String {
    cookie(auth, token, max_age_secs)
}

/// `Set-Cookie` value that makes the browser drop the session
pub fn clear_session_cookie(auth: &Auth) -> String {
    cookie(auth, "", 0)
}

fn cookie(auth: &Auth, value: &str, max_age_secs: i64) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}",
        auth.cookie_name, value, max_age_secs
    );
    // Cross-site frontends need SameSite=None, which browsers only accept with Secure
    if auth.secure_cookies {
        cookie.push_str("; Secure; SameSite=None");
    } else {
        cookie.push_str("; SameSite=Lax");
    }
    if let Some(domain) = auth.cookie_domain.as_deref().filter(|d| !d.is_empty()) {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    cookie
}
