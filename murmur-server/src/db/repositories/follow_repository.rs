use anyhow::Context;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use murmur_types::{FollowOutcome, UserSummary};

use crate::db::rows::{to_db_time, user_summary_from_row};
use crate::db::{fold_case, DbPool, StoreError, StoreResult};

/// Directed follow edges between users
pub struct FollowRepository {
    pool: DbPool,
}

fn user_id_by_name(conn: &Connection, username: &str) -> StoreResult<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT user_id FROM users WHERE username_key = ?1 LIMIT 1",
            [fold_case(username.trim())],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

fn require_user_id(conn: &Connection, username: &str) -> StoreResult<i64> {
    user_id_by_name(conn, username)?.ok_or(StoreError::NotFound("User"))
}

impl FollowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Follow `target`; following someone twice is not an error
    pub fn follow(&self, follower_id: i64, target: &str) -> StoreResult<FollowOutcome> {
        let conn = self.pool.get()?;
        let followee_id = require_user_id(&conn, target)?;
        if followee_id == follower_id {
            return Err(StoreError::Forbidden("You cannot follow yourself"));
        }

        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO follows (follower_id, followee_id, created_at)
                 VALUES (?1, ?2, ?3)",
                (follower_id, followee_id, to_db_time(&Utc::now())),
            )
            .context("Failed to follow user")?;

        Ok(if inserted == 1 {
            FollowOutcome::Created
        } else {
            FollowOutcome::AlreadyFollowing
        })
    }

    /// Stop following `target`; a missing edge is fine
    pub fn unfollow(&self, follower_id: i64, target: &str) -> StoreResult<()> {
        let conn = self.pool.get()?;
        let followee_id = require_user_id(&conn, target)?;
        conn.execute(
            "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
            (follower_id, followee_id),
        )
        .context("Failed to unfollow user")?;
        Ok(())
    }

    /// Drop `follower` from my followers; returns whether an edge existed
    pub fn remove_follower(&self, followee_id: i64, follower: &str) -> StoreResult<bool> {
        let conn = self.pool.get()?;
        let follower_id = require_user_id(&conn, follower)?;
        let removed = conn
            .execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
                (follower_id, followee_id),
            )
            .context("Failed to remove follower")?;
        Ok(removed > 0)
    }

    /// Unknown usernames are simply not followed
    pub fn is_following(&self, follower_id: i64, target: &str) -> StoreResult<bool> {
        let conn = self.pool.get()?;
        let Some(followee_id) = user_id_by_name(&conn, target)? else {
            return Ok(false);
        };

        let following: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = ?1 AND followee_id = ?2)",
            (follower_id, followee_id),
            |row| row.get(0),
        )?;
        Ok(following)
    }

    /// Users following `username`, alphabetical
    pub fn list_followers(&self, username: &str) -> StoreResult<Vec<UserSummary>> {
        let conn = self.pool.get()?;
        let user_id = require_user_id(&conn, username)?;

        let mut stmt = conn.prepare(
            "SELECT u.user_id, u.username
             FROM follows f
             JOIN users u ON u.user_id = f.follower_id
             WHERE f.followee_id = ?1
             ORDER BY u.username_key ASC, u.user_id ASC",
        )?;
        let users = stmt
            .query_map([user_id], user_summary_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list followers")?;
        Ok(users)
    }

    /// Users `username` follows, alphabetical
    pub fn list_following(&self, username: &str) -> StoreResult<Vec<UserSummary>> {
        let conn = self.pool.get()?;
        let user_id = require_user_id(&conn, username)?;

        let mut stmt = conn.prepare(
            "SELECT u.user_id, u.username
             FROM follows f
             JOIN users u ON u.user_id = f.followee_id
             WHERE f.follower_id = ?1
             ORDER BY u.username_key ASC, u.user_id ASC",
        )?;
        let users = stmt
            .query_map([user_id], user_summary_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list following")?;
        Ok(users)
    }

    pub fn count(&self) -> StoreResult<i64> {
        let conn = self.pool.get()?;
        let count = conn.query_row("SELECT COUNT(*) FROM follows", [], |row| row.get(0))?;
        Ok(count)
    }
}
