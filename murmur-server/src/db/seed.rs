use anyhow::{Context, Result};

use super::repositories::{
    CommentRepository, FollowRepository, LikeRepository, PostRepository, UserRepository,
};
use super::Database;
use crate::password::hash_password;

/// Password shared by every demo account
pub const DEMO_PASSWORD: &str = "murmur-demo";

const DEMO_USERS: &[&str] = &["alice", "bob", "carol", "dave"];

const DEMO_POSTS: &[(&str, &str)] = &[
    ("alice", "hello world"),
    ("bob", "Just shipped a tiny feature. Feels good."),
    ("carol", "Anyone else reading about search ranking today?"),
    ("alice", "Coffee first, then code."),
    ("dave", "hello from the quiet corner of the internet"),
];

/// (follower, followee)
const DEMO_FOLLOWS: &[(&str, &str)] = &[
    ("bob", "alice"),
    ("carol", "alice"),
    ("alice", "carol"),
    ("dave", "bob"),
];

/// What a seeding run inserted
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub posts: usize,
    pub follows: usize,
    pub likes: usize,
    pub comments: usize,
}

impl SeedSummary {
    pub fn is_empty(&self) -> bool {
        self.users == 0
    }
}

impl Database {
    /// Seed a small demo community
    ///
    /// Does nothing when any user already exists, so it is safe to call on
    /// every startup.
    pub fn seed_demo_data(&self) -> Result<SeedSummary> {
        let users = UserRepository::new(self.pool.clone());
        if users.count()? > 0 {
            tracing::debug!("Database already has users, skipping demo seed");
            return Ok(SeedSummary::default());
        }

        let posts = PostRepository::new(self.pool.clone());
        let follows = FollowRepository::new(self.pool.clone());
        let likes = LikeRepository::new(self.pool.clone());
        let comments = CommentRepository::new(self.pool.clone());
        let mut summary = SeedSummary::default();

        let password_hash = hash_password(DEMO_PASSWORD)?;
        let mut user_ids = Vec::with_capacity(DEMO_USERS.len());
        for name in DEMO_USERS {
            let id = users
                .create(name, &password_hash)
                .with_context(|| format!("Failed to seed user {name}"))?;
            user_ids.push((*name, id));
            summary.users += 1;
        }
        let id_of = |name: &str| {
            user_ids
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, id)| *id)
                .with_context(|| format!("Unknown demo user {name}"))
        };

        let mut post_ids = Vec::with_capacity(DEMO_POSTS.len());
        for (author, text) in DEMO_POSTS {
            post_ids.push(posts.create(id_of(*author)?, text)?);
            summary.posts += 1;
        }

        for (follower, followee) in DEMO_FOLLOWS {
            follows.follow(id_of(*follower)?, followee)?;
            summary.follows += 1;
        }

        // Everyone but the author likes the first post
        if let Some(&first) = post_ids.first() {
            for (name, id) in &user_ids {
                if *name != DEMO_POSTS[0].0 {
                    likes.like(*id, first)?;
                    summary.likes += 1;
                }
            }
            comments.create(id_of("bob")?, first, "welcome aboard!")?;
            summary.comments += 1;
        }

        tracing::info!(
            users = summary.users,
            posts = summary.posts,
            follows = summary.follows,
            "Seeded demo data"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::verify_password;

    #[test]
    fn test_seed_populates_empty_database() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");

        let summary = db.seed_demo_data().expect("Failed to seed demo data");
        assert_eq!(summary.users, DEMO_USERS.len());
        assert_eq!(summary.posts, DEMO_POSTS.len());
        assert_eq!(summary.likes, DEMO_USERS.len() - 1);

        let users = UserRepository::new(db.pool.clone());
        let (_, hash) = users.get_credentials("alice").unwrap().expect("alice exists");
        assert!(verify_password(DEMO_PASSWORD, &hash).unwrap());
    }

    #[test]
    fn test_seed_is_skipped_when_users_exist() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");

        db.seed_demo_data().expect("first seed");
        let second = db.seed_demo_data().expect("second seed");

        assert!(second.is_empty());
        assert_eq!(
            UserRepository::new(db.pool.clone()).count().unwrap(),
            DEMO_USERS.len() as i64
        );
    }
}
