use anyhow::Context;
use chrono::Utc;
use rusqlite::OptionalExtension;

use murmur_types::{Post, PostView};

use crate::db::rows::{post_from_row, post_view_from_row, to_db_time, FEED_ORDER, POST_VIEW_SELECT};
use crate::db::{DbPool, StoreError, StoreResult};

const POST_SELECT: &str = "
    SELECT p.post_id, p.author_id, u.username, p.body, p.created_at, p.updated_at
      FROM posts p
      JOIN users u ON u.user_id = p.author_id";

/// Content store for posts
pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new post; the text is stored verbatim
    pub fn create(&self, author_id: i64, text: &str) -> StoreResult<i64> {
        if text.trim().is_empty() {
            return Err(StoreError::Invalid("post information missing".to_string()));
        }

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO posts (author_id, body, created_at) VALUES (?1, ?2, ?3)",
            (author_id, text, to_db_time(&Utc::now())),
        )
        .context("Failed to create post")?;
        Ok(conn.last_insert_rowid())
    }

    /// Get a single post by ID
    pub fn get_by_id(&self, post_id: i64) -> StoreResult<Option<Post>> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                &format!("{POST_SELECT} WHERE p.post_id = ?1"),
                [post_id],
                post_from_row,
            )
            .optional()?;
        Ok(post)
    }

    /// Like `get_by_id`, but a missing post is an error
    pub fn get(&self, post_id: i64) -> StoreResult<Post> {
        self.get_by_id(post_id)?.ok_or(StoreError::NotFound("Post"))
    }

    /// A single post with like annotations for `viewer`
    pub fn get_view(&self, post_id: i64, viewer: Option<i64>) -> StoreResult<PostView> {
        let conn = self.pool.get()?;
        conn.query_row(
            &format!("{POST_VIEW_SELECT} WHERE p.post_id = ?2"),
            (viewer, post_id),
            |row| post_view_from_row(row, viewer),
        )
        .optional()?
        .ok_or(StoreError::NotFound("Post"))
    }

    /// Check whether a post exists
    pub fn exists(&self, post_id: i64) -> StoreResult<bool> {
        let conn = self.pool.get()?;
        let found: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM posts WHERE post_id = ?1)",
            [post_id],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    /// All posts by an author, most recently touched first
    pub fn list_by_author(&self, author_id: i64, viewer: Option<i64>) -> StoreResult<Vec<PostView>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{POST_VIEW_SELECT} WHERE p.author_id = ?2 {FEED_ORDER}"
        ))?;

        let posts = stmt
            .query_map((viewer, author_id), |row| post_view_from_row(row, viewer))?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list posts by author")?;
        Ok(posts)
    }

    /// Replace a post's text and stamp `updated_at`
    ///
    /// Only the author may edit. The stored text is trimmed.
    pub fn update(&self, post_id: i64, requester_id: i64, text: &str) -> StoreResult<Post> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::Invalid("Text is required".to_string()));
        }

        let current = self.get(post_id)?;
        if current.author_id != requester_id {
            return Err(StoreError::Forbidden("Only the author can edit this post"));
        }

        // updated_at never precedes created_at, even if the clock stepped back
        let edited_at = Utc::now().max(current.created_at);
        let changed = {
            let conn = self.pool.get()?;
            conn.execute(
                "UPDATE posts SET body = ?1, updated_at = ?2
                 WHERE post_id = ?3 AND author_id = ?4",
                (text, to_db_time(&edited_at), post_id, requester_id),
            )
            .context("Failed to update post")?
        };
        if changed == 0 {
            // Deleted between the ownership check and the write
            return Err(StoreError::NotFound("Post"));
        }

        self.get(post_id)
    }

    /// Delete a post along with its comments and likes
    pub fn delete(&self, post_id: i64, requester_id: i64) -> StoreResult<()> {
        let current = self.get(post_id)?;
        if current.author_id != requester_id {
            return Err(StoreError::Forbidden("Only the author can delete this post"));
        }

        let conn = self.pool.get()?;
        let deleted = conn
            .execute(
                "DELETE FROM posts WHERE post_id = ?1 AND author_id = ?2",
                (post_id, requester_id),
            )
            .context("Failed to delete post")?;
        if deleted == 0 {
            return Err(StoreError::NotFound("Post"));
        }
        Ok(())
    }

    /// Every post body, oldest first (maintenance tooling)
    pub fn list_bodies(&self) -> StoreResult<Vec<(i64, String)>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT post_id, body FROM posts ORDER BY post_id ASC")?;
        let bodies = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list post bodies")?;
        Ok(bodies)
    }

    /// Overwrite a body without counting it as a user edit
    pub fn rewrite_body(&self, post_id: i64, body: &str) -> StoreResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE posts SET body = ?1 WHERE post_id = ?2",
            (body, post_id),
        )
        .context("Failed to rewrite post body")?;
        Ok(())
    }

    /// Total number of posts
    pub fn count(&self) -> StoreResult<i64> {
        let conn = self.pool.get()?;
        let count = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count)
    }
}
