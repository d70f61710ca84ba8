use anyhow::Context;

use murmur_types::PostView;

use crate::db::rows::{post_view_from_row, FEED_ORDER, POST_VIEW_SELECT};
use crate::db::{DbPool, StoreResult};

/// Maximum number of posts returned by either feed
pub const FEED_PAGE_SIZE: i64 = 100;

/// Composes the global and following feeds
pub struct FeedRepository {
    pool: DbPool,
}

impl FeedRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Every post, most recently touched first
    pub fn global(&self, viewer: Option<i64>) -> StoreResult<Vec<PostView>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!("{POST_VIEW_SELECT} {FEED_ORDER} LIMIT ?2"))?;

        let posts = stmt
            .query_map((viewer, FEED_PAGE_SIZE), |row| post_view_from_row(row, viewer))?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load global feed")?;
        Ok(posts)
    }

    /// Posts by the viewer and by everyone the viewer follows
    pub fn following(&self, viewer_id: i64) -> StoreResult<Vec<PostView>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{POST_VIEW_SELECT}
             WHERE p.author_id = ?1
                OR EXISTS (SELECT 1 FROM follows f
                           WHERE f.follower_id = ?1 AND f.followee_id = p.author_id)
             {FEED_ORDER}
             LIMIT ?2"
        ))?;

        let viewer = Some(viewer_id);
        let posts = stmt
            .query_map((viewer_id, FEED_PAGE_SIZE), |row| post_view_from_row(row, viewer))?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load following feed")?;
        Ok(posts)
    }
}
