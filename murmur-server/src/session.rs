use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::{to_db_time, Database};

/// Database-backed session manager for token authentication
///
/// Tokens are UUID v4 strings with a fixed lifetime. Expired tokens are
/// rejected on use and purged in bulk by `cleanup_expired_sessions`.
#[derive(Clone)]
pub struct SessionManager {
    db: Database,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(db: Database, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Create a new session for a user and return its token
    pub fn create_session(&self, user_id: i64) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at
            .checked_add_signed(self.ttl)
            .context("Session expiry out of range")?;

        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            (
                &token,
                user_id,
                to_db_time(&created_at),
                to_db_time(&expires_at),
            ),
        )
        .context("Failed to create session")?;

        tracing::info!(user_id, "Created session");
        Ok(token)
    }

    /// Resolve a token to its user
    ///
    /// Returns `None` for unknown or expired tokens; an expired token is
    /// deleted on the way out.
    pub fn validate_session(&self, token: &str) -> Result<Option<i64>> {
        let found: Option<(i64, String)> = {
            let conn = self.db.connection()?;
            conn.query_row(
                "SELECT user_id, expires_at FROM sessions WHERE token = ?1",
                [token],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("Failed to look up session")?
        };

        let Some((user_id, expires_at)) = found else {
            return Ok(None);
        };

        let expires_at = expires_at
            .parse::<DateTime<Utc>>()
            .context("Failed to parse expiry time")?;

        if Utc::now() > expires_at {
            self.delete_session(token)?;
            tracing::debug!(user_id, "Rejected expired session");
            return Ok(None);
        }

        Ok(Some(user_id))
    }

    /// Delete a session (logout)
    pub fn delete_session(&self, token: &str) -> Result<()> {
        let conn = self.db.connection()?;
        let rows_affected = conn
            .execute("DELETE FROM sessions WHERE token = ?1", [token])
            .context("Failed to delete session")?;

        if rows_affected > 0 {
            tracing::info!("Deleted session");
        }

        Ok(())
    }

    /// Remove every session past its expiry; returns how many were removed
    pub fn cleanup_expired_sessions(&self) -> Result<usize> {
        let conn = self.db.connection()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE expires_at < ?1",
                [to_db_time(&Utc::now())],
            )
            .context("Failed to cleanup expired sessions")?;

        if rows_affected > 0 {
            tracing::info!("Cleaned up {} expired sessions", rows_affected);
        }

        Ok(rows_affected)
    }
}
