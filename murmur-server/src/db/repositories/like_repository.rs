use anyhow::Context;
use chrono::Utc;
use rusqlite::Connection;

use murmur_types::{LikeState, LikeStatus};

use crate::db::rows::to_db_time;
use crate::db::{DbPool, StoreError, StoreResult};

/// Like toggling; liking twice or unliking an unliked post is a no-op
pub struct LikeRepository {
    pool: DbPool,
}

fn ensure_post(conn: &Connection, post_id: i64) -> StoreResult<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM posts WHERE post_id = ?1)",
        [post_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(StoreError::NotFound("Post"))
    }
}

fn like_count(conn: &Connection, post_id: i64) -> StoreResult<i64> {
    let likes = conn.query_row(
        "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
        [post_id],
        |row| row.get(0),
    )?;
    Ok(likes)
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn like(&self, user_id: i64, post_id: i64) -> StoreResult<LikeState> {
        let conn = self.pool.get()?;
        ensure_post(&conn, post_id)?;

        conn.execute(
            "INSERT OR IGNORE INTO likes (user_id, post_id, created_at) VALUES (?1, ?2, ?3)",
            (user_id, post_id, to_db_time(&Utc::now())),
        )
        .context("Failed to like post")?;

        Ok(LikeState {
            liked: true,
            likes: like_count(&conn, post_id)?,
        })
    }

    pub fn unlike(&self, user_id: i64, post_id: i64) -> StoreResult<LikeState> {
        let conn = self.pool.get()?;
        ensure_post(&conn, post_id)?;

        conn.execute(
            "DELETE FROM likes WHERE user_id = ?1 AND post_id = ?2",
            (user_id, post_id),
        )
        .context("Failed to unlike post")?;

        Ok(LikeState {
            liked: false,
            likes: like_count(&conn, post_id)?,
        })
    }

    /// Like state as seen by `viewer`; anonymous viewers never have liked
    pub fn status(&self, viewer: Option<i64>, post_id: i64) -> StoreResult<LikeStatus> {
        let conn = self.pool.get()?;
        ensure_post(&conn, post_id)?;

        let liked = match viewer {
            Some(user_id) => conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM likes WHERE user_id = ?1 AND post_id = ?2)",
                (user_id, post_id),
                |row| row.get(0),
            )?,
            None => false,
        };

        Ok(LikeStatus {
            authed: viewer.is_some(),
            liked,
            likes: like_count(&conn, post_id)?,
        })
    }

    pub fn count(&self) -> StoreResult<i64> {
        let conn = self.pool.get()?;
        let count = conn.query_row("SELECT COUNT(*) FROM likes", [], |row| row.get(0))?;
        Ok(count)
    }
}
