use anyhow::Context;
use chrono::Utc;
use rusqlite::{OptionalExtension, Row};

use murmur_types::{User, UserProfile, UserSummary};

use crate::db::error::is_unique_violation;
use crate::db::rows::{timestamp, to_db_time, user_summary_from_row};
use crate::db::{fold_case, DbPool, StoreError, StoreResult};

use super::USER_SEARCH_LIMIT;

pub struct UserRepository {
    pool: DbPool,
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        joined_at: timestamp(row, 2)?,
    })
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a user; usernames are unique regardless of case
    pub fn create(&self, username: &str, password_hash: &str) -> StoreResult<i64> {
        let username = username.trim();
        if username.is_empty() {
            return Err(StoreError::Invalid(
                "username and password are required".to_string(),
            ));
        }

        let conn = self.pool.get()?;
        let inserted = conn.execute(
            "INSERT INTO users (username, username_key, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            (
                username,
                fold_case(username),
                password_hash,
                to_db_time(&Utc::now()),
            ),
        );

        match inserted {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => {
                Err(StoreError::Conflict("username already exists".to_string()))
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to create user").into()),
        }
    }

    /// Get user by ID
    pub fn get_by_id(&self, user_id: i64) -> StoreResult<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                "SELECT user_id, username, created_at FROM users WHERE user_id = ?1",
                [user_id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Get user by username (case-insensitive)
    pub fn get_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                "SELECT user_id, username, created_at FROM users WHERE username_key = ?1 LIMIT 1",
                [fold_case(username.trim())],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Like `get_by_username`, but a missing user is an error
    pub fn require_by_username(&self, username: &str) -> StoreResult<User> {
        self.get_by_username(username)?
            .ok_or(StoreError::NotFound("User"))
    }

    /// Look up a user together with the stored password hash
    pub fn get_credentials(&self, username: &str) -> StoreResult<Option<(User, String)>> {
        let conn = self.pool.get()?;
        let found = conn
            .query_row(
                "SELECT user_id, username, created_at, password_hash
                 FROM users WHERE username_key = ?1 LIMIT 1",
                [fold_case(username.trim())],
                |row| Ok((user_from_row(row)?, row.get::<_, String>(3)?)),
            )
            .optional()?;
        Ok(found)
    }

    /// Case-insensitive substring search over usernames, alphabetical
    pub fn search(&self, query: &str) -> StoreResult<Vec<UserSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, username FROM users
             WHERE instr(username_key, ?1) > 0
             ORDER BY username_key ASC, user_id ASC
             LIMIT ?2",
        )?;
        let users = stmt
            .query_map((fold_case(query), USER_SEARCH_LIMIT), user_summary_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to search users")?;
        Ok(users)
    }

    /// Public profile with follow and post counts
    pub fn profile(&self, username: &str) -> StoreResult<UserProfile> {
        let conn = self.pool.get()?;
        conn.query_row(
            "SELECT u.user_id, u.username, u.created_at,
                    (SELECT COUNT(*) FROM follows WHERE followee_id = u.user_id),
                    (SELECT COUNT(*) FROM follows WHERE follower_id = u.user_id),
                    (SELECT COUNT(*) FROM posts WHERE author_id = u.user_id)
             FROM users u
             WHERE u.username_key = ?1
             LIMIT 1",
            [fold_case(username.trim())],
            |row| {
                Ok(UserProfile {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    joined_at: timestamp(row, 2)?,
                    follower_count: row.get(3)?,
                    following_count: row.get(4)?,
                    post_count: row.get(5)?,
                })
            },
        )
        .optional()?
        .ok_or(StoreError::NotFound("User"))
    }

    /// Total number of users
    pub fn count(&self) -> StoreResult<i64> {
        let conn = self.pool.get()?;
        let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }
}
