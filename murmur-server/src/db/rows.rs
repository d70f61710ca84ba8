//! Row mapping shared by the repositories.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{types::Type, Row};

use murmur_types::{Comment, Post, PostView, UserSummary};

/// Columns of a viewer-annotated post. The viewer id is always bound as `?1`
/// (NULL for anonymous viewers).
pub(crate) const POST_VIEW_SELECT: &str = "
    SELECT p.post_id AS post_id, p.author_id AS author_id, u.username AS username,
           p.body AS body, p.created_at AS created_at, p.updated_at AS updated_at,
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.post_id) AS like_count,
           EXISTS (SELECT 1 FROM likes l WHERE l.post_id = p.post_id AND l.user_id = ?1) AS liked
      FROM posts p
      JOIN users u ON u.user_id = p.author_id";

/// Most recently touched first; id breaks ties between identical timestamps.
pub(crate) const FEED_ORDER: &str =
    "ORDER BY COALESCE(p.updated_at, p.created_at) DESC, p.post_id DESC";

pub(crate) fn to_db_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_time(idx, &raw)
}

pub(crate) fn optional_timestamp(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| parse_time(idx, &raw)).transpose()
}

fn parse_time(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Maps the first six columns of `POST_VIEW_SELECT`.
pub(crate) fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author: row.get(2)?,
        text: row.get(3)?,
        created_at: timestamp(row, 4)?,
        updated_at: optional_timestamp(row, 5)?,
    })
}

pub(crate) fn post_view_from_row(row: &Row<'_>, viewer: Option<i64>) -> rusqlite::Result<PostView> {
    let liked: bool = row.get(7)?;
    Ok(PostView {
        post: post_from_row(row)?,
        likes: row.get(6)?,
        liked_by_me: viewer.map(|_| liked),
    })
}

pub(crate) fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        author: row.get(3)?,
        text: row.get(4)?,
        created_at: timestamp(row, 5)?,
    })
}

pub(crate) fn user_summary_from_row(row: &Row<'_>) -> rusqlite::Result<UserSummary> {
    Ok(UserSummary {
        id: row.get(0)?,
        username: row.get(1)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_db_time_is_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let fractional = whole + chrono::Duration::microseconds(1500);

        let a = to_db_time(&whole);
        let b = to_db_time(&fractional);
        assert_eq!(a.len(), b.len());
        assert!(a < b, "text order must follow time order");
        assert_eq!(a, "2024-01-01T00:00:00.000000Z");
    }

    #[test]
    fn test_db_time_parses_back() {
        let time = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let parsed: DateTime<Utc> = to_db_time(&time).parse().unwrap();
        assert_eq!(parsed, time);
    }
}
