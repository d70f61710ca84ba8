use anyhow::Context;
use chrono::Utc;

use murmur_types::Comment;

use crate::db::rows::{comment_from_row, to_db_time};
use crate::db::{DbPool, StoreError, StoreResult};

pub struct CommentRepository {
    pool: DbPool,
}

impl CommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a comment on an existing post
    pub fn create(&self, author_id: i64, post_id: i64, text: &str) -> StoreResult<i64> {
        if text.trim().is_empty() {
            return Err(StoreError::Invalid("Comment text is required".to_string()));
        }

        let conn = self.pool.get()?;
        let post_exists: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM posts WHERE post_id = ?1)",
            [post_id],
            |row| row.get(0),
        )?;
        if !post_exists {
            return Err(StoreError::NotFound("Post"));
        }

        conn.execute(
            "INSERT INTO comments (post_id, author_id, body, created_at) VALUES (?1, ?2, ?3, ?4)",
            (post_id, author_id, text, to_db_time(&Utc::now())),
        )
        .context("Failed to create comment")?;
        Ok(conn.last_insert_rowid())
    }

    /// Comments on a post, newest first
    pub fn list_by_post(&self, post_id: i64) -> StoreResult<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT c.comment_id, c.post_id, c.author_id, u.username, c.body, c.created_at
             FROM comments c
             JOIN users u ON u.user_id = c.author_id
             WHERE c.post_id = ?1
             ORDER BY c.created_at DESC, c.comment_id DESC",
        )?;

        let comments = stmt
            .query_map([post_id], comment_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list comments")?;
        Ok(comments)
    }

    pub fn list_bodies(&self) -> StoreResult<Vec<(i64, String)>> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare("SELECT comment_id, body FROM comments ORDER BY comment_id ASC")?;
        let bodies = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list comment bodies")?;
        Ok(bodies)
    }

    pub fn rewrite_body(&self, comment_id: i64, body: &str) -> StoreResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE comments SET body = ?1 WHERE comment_id = ?2",
            (body, comment_id),
        )
        .context("Failed to rewrite comment body")?;
        Ok(())
    }

    pub fn count(&self) -> StoreResult<i64> {
        let conn = self.pool.get()?;
        let count = conn.query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))?;
        Ok(count)
    }
}
