use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::api::{extract::session_token, ApiError};
use crate::state::AppState;

/// Entries beyond this trigger a sweep of stale windows
const SWEEP_THRESHOLD: usize = 10_000;

/// In-memory fixed-window rate limiter keyed by user id
#[derive(Clone)]
pub struct RateLimiter {
    // user_id -> (request_count, window_start)
    state: Arc<Mutex<HashMap<i64, (u32, Instant)>>>,
    max_requests: u32,
    window_duration: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_duration: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window_duration,
        }
    }

    /// Count a request against the user's window
    ///
    /// On rejection returns the seconds left until the window resets.
    pub fn check_rate_limit(&self, user_id: i64) -> Result<(), u64> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();

        if state.len() > SWEEP_THRESHOLD {
            state.retain(|_, (_, start)| now.duration_since(*start) < self.window_duration * 2);
        }

        match state.get_mut(&user_id) {
            Some((count, window_start)) => {
                let elapsed = now.duration_since(*window_start);
                if elapsed < self.window_duration {
                    if *count >= self.max_requests {
                        return Err((self.window_duration - elapsed).as_secs().max(1));
                    }
                    *count += 1;
                } else {
                    *window_start = now;
                    *count = 1;
                }
            }
            None => {
                state.insert(user_id, (1, now));
            }
        }

        Ok(())
    }
}

/// Rate limit authenticated requests
///
/// Only tokens that resolve to a live session are counted, so anonymous
/// traffic and junk tokens pass through to the handlers.
pub async fn rate_limit_middleware(
    State(app): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let user_id = match session_token(request.headers(), &app.auth.cookie_name) {
        Some(token) => match app.authenticated_user_id(&token) {
            Ok(user_id) => user_id,
            Err(e) => {
                tracing::error!("Session lookup failed in rate limiter: {:#}", e);
                None
            }
        },
        None => None,
    };

    if let Some(user_id) = user_id {
        if let Err(retry_after) = app.rate_limiter.check_rate_limit(user_id) {
            tracing::warn!(user_id, retry_after, "Rate limit exceeded");
            return ApiError::TooManyRequests(format!(
                "Rate limit exceeded. Try again in {retry_after} seconds."
            ))
            .into_response();
        }
    }

    next.run(request).await
}
