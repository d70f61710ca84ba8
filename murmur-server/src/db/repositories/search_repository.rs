use anyhow::Context;

use murmur_types::{MatchTier, SearchHit, UserSummary};

use crate::db::rows::{post_view_from_row, POST_VIEW_SELECT};
use crate::db::{fold_case, DbPool, StoreResult};

use super::UserRepository;

/// Maximum number of posts a search returns
pub const POST_SEARCH_LIMIT: i64 = 200;
/// Maximum number of users a search returns
pub const USER_SEARCH_LIMIT: i64 = 100;

pub struct SearchRepository {
    pool: DbPool,
}

impl SearchRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Posts containing `query`, best match first
    pub fn posts(&self, query: &str, viewer: Option<i64>) -> StoreResult<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        // A post lands in the strongest tier it satisfies. `instr` keeps
        // `%` and `_` in the query literal; ?2 is already folded.
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT v.*,
                    CASE
                        WHEN fold(v.body) = ?2 THEN 100
                        WHEN substr(fold(v.body), 1, length(?2)) = ?2 THEN 90
                        WHEN instr(' ' || fold(v.body) || ' ', ' ' || ?2 || ' ') > 0 THEN 80
                        ELSE 70
                    END AS score
             FROM ({POST_VIEW_SELECT} WHERE instr(fold(p.body), ?2) > 0) v
             ORDER BY score DESC, COALESCE(v.updated_at, v.created_at) DESC, v.post_id DESC
             LIMIT ?3"
        ))?;

        let hits = stmt
            .query_map((viewer, fold_case(query), POST_SEARCH_LIMIT), |row| {
                let score: i32 = row.get(8)?;
                Ok(SearchHit {
                    view: post_view_from_row(row, viewer)?,
                    score,
                    tier: MatchTier::from_score(score).unwrap_or(MatchTier::Substring),
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to search posts")?;
        Ok(hits)
    }

    /// Users whose name contains `query`, alphabetical
    pub fn users(&self, query: &str) -> StoreResult<Vec<UserSummary>> {
        UserRepository::new(self.pool.clone()).search(query)
    }
}
