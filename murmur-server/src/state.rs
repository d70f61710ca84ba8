use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::{Auth, Settings};
use crate::content_filter::{self, ContentFilter};
use crate::db::Database;
use crate::rate_limit::RateLimiter;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub session_manager: SessionManager,
    pub filter: Arc<dyn ContentFilter>,
    pub rate_limiter: RateLimiter,
    pub auth: Arc<Auth>,
}

impl AppState {
    pub fn new(db: Database, settings: &Settings) -> Result<Self> {
        let ttl_hours = settings.auth.session_ttl_hours;
        let session_ttl = chrono::Duration::try_hours(ttl_hours)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .filter(|ttl| chrono::Utc::now().checked_add_signed(*ttl).is_some())
            .with_context(|| format!("auth.session_ttl_hours out of range: {ttl_hours}"))?;
        let session_manager = SessionManager::new(db.clone(), session_ttl);
        let rate_limiter = RateLimiter::new(
            settings.rate_limit.max_requests,
            Duration::from_secs(settings.rate_limit.window_seconds),
        );

        Ok(Self {
            db,
            session_manager,
            filter: content_filter::from_settings(&settings.content_filter)?,
            rate_limiter,
            auth: Arc::new(settings.auth.clone()),
        })
    }

    /// Resolve a session token to a user id; unknown or expired tokens yield `None`
    pub fn authenticated_user_id(&self, token: &str) -> Result<Option<i64>> {
        self.session_manager.validate_session(token)
    }
}
