use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use murmur_server::config::Settings;
use murmur_server::content_filter::{self, ContentFilter};
use murmur_server::db::repositories::{
    CommentRepository, FollowRepository, LikeRepository, PostRepository, UserRepository,
};
use murmur_server::db::Database;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Murmur operator tooling
///
/// Works directly on the SQLite file; stop the server before rewriting text.
#[derive(Parser, Debug)]
#[command(name = "murmur-admin")]
#[command(about = "Maintenance commands for a Murmur database", long_about = None)]
struct Args {
    /// Path to the SQLite database file (defaults to the server's configured path)
    #[arg(short, long, env = "DATABASE_PATH", global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the schema (safe to re-run)
    Init,
    /// Insert the demo community into an empty database
    Seed,
    /// Print row counts for every table
    Stats,
    /// Re-apply the content filter to every stored post and comment
    Recensor {
        /// Report what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

/// Statistics collected during a recensor run
#[derive(Debug, Default, PartialEq, Eq)]
struct RecensorStats {
    posts_scanned: usize,
    posts_changed: usize,
    comments_scanned: usize,
    comments_changed: usize,
    errors: Vec<String>,
}

impl RecensorStats {
    fn changed(&self) -> usize {
        self.posts_changed + self.comments_changed
    }
}

/// Which table a body came from
#[derive(Debug, Clone, Copy)]
enum Target {
    Post,
    Comment,
}

/// Censor every body in one table, rewriting the ones the filter changes
fn recensor_table(
    db: &Database,
    target: Target,
    filter: &dyn ContentFilter,
    stats: &mut RecensorStats,
    dry_run: bool,
) -> Result<()> {
    let posts = PostRepository::new(db.pool.clone());
    let comments = CommentRepository::new(db.pool.clone());

    let bodies = match target {
        Target::Post => posts.list_bodies(),
        Target::Comment => comments.list_bodies(),
    }
    .with_context(|| format!("Failed to list {target:?} bodies"))?;

    for (id, body) in bodies {
        let censored = filter.censor(&body);
        let changed = censored != body;

        match target {
            Target::Post => {
                stats.posts_scanned += 1;
                stats.posts_changed += usize::from(changed);
            }
            Target::Comment => {
                stats.comments_scanned += 1;
                stats.comments_changed += usize::from(changed);
            }
        }

        if !changed || dry_run {
            continue;
        }

        let written = match target {
            Target::Post => posts.rewrite_body(id, &censored),
            Target::Comment => comments.rewrite_body(id, &censored),
        };
        if let Err(e) = written {
            let error_msg = format!("Error rewriting {target:?} {id}: {e:#}");
            tracing::error!("{}", error_msg);
            stats.errors.push(error_msg);
        }
    }

    Ok(())
}

fn recensor(db: &Database, filter: &dyn ContentFilter, dry_run: bool) -> Result<RecensorStats> {
    let mut stats = RecensorStats::default();
    recensor_table(db, Target::Post, filter, &mut stats, dry_run)?;
    recensor_table(db, Target::Comment, filter, &mut stats, dry_run)?;
    Ok(stats)
}

/// Open an existing database file and make sure the schema is present
fn connect_database(path: &str) -> Result<Database> {
    if !Path::new(path).exists() {
        anyhow::bail!("Database file not found: {} (run `murmur-admin init` first)", path);
    }

    let db = Database::new(path, 1).context("Failed to open database")?;
    let conn = db.connection()?;
    let has_posts: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='posts'",
            [],
            |row| row.get::<_, i64>(0).map(|count| count > 0),
        )
        .context("Failed to check for posts table")?;
    drop(conn);

    if !has_posts {
        anyhow::bail!("Database schema is invalid - posts table not found");
    }
    Ok(db)
}

fn print_stats(db: &Database) -> Result<()> {
    let users = UserRepository::new(db.pool.clone()).count()?;
    let posts = PostRepository::new(db.pool.clone()).count()?;
    let comments = CommentRepository::new(db.pool.clone()).count()?;
    let follows = FollowRepository::new(db.pool.clone()).count()?;
    let likes = LikeRepository::new(db.pool.clone()).count()?;

    println!("Users:    {users}");
    println!("Posts:    {posts}");
    println!("Comments: {comments}");
    println!("Follows:  {follows}");
    println!("Likes:    {likes}");
    Ok(())
}

fn display_recensor_stats(stats: &RecensorStats, dry_run: bool) {
    println!();
    println!("Recensor Summary");
    println!("================");
    println!(
        "Posts:    {} scanned, {} changed",
        stats.posts_scanned, stats.posts_changed
    );
    println!(
        "Comments: {} scanned, {} changed",
        stats.comments_scanned, stats.comments_changed
    );

    if !stats.errors.is_empty() {
        println!();
        println!("Errors encountered: {}", stats.errors.len());
        for (i, error) in stats.errors.iter().enumerate() {
            println!("  {}. {}", i + 1, error);
        }
    }

    println!();
    if dry_run {
        println!("Dry run: {} bodies would be rewritten.", stats.changed());
    } else {
        println!("Rewrote {} bodies.", stats.changed());
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "murmur_admin=info,murmur_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let settings = Settings::new().context("Failed to load settings")?;
    let path = args.database.unwrap_or(settings.database.path.clone());

    match args.command {
        Command::Init => {
            let db = Database::new(&path, 1).context("Failed to open database")?;
            db.initialize()?;
            println!("Schema ready in {path}");
        }
        Command::Seed => {
            let db = connect_database(&path)?;
            let summary = db.seed_demo_data()?;
            if summary.is_empty() {
                println!("Database already has users - nothing seeded.");
            } else {
                println!(
                    "Seeded {} users, {} posts, {} follows, {} likes, {} comments",
                    summary.users, summary.posts, summary.follows, summary.likes, summary.comments
                );
            }
        }
        Command::Stats => {
            let db = connect_database(&path)?;
            println!("Database: {path}");
            print_stats(&db)?;
        }
        Command::Recensor { dry_run } => {
            let db = connect_database(&path)?;
            if !settings.content_filter.enabled {
                println!("Content filter is disabled in settings - nothing to do.");
                return Ok(());
            }
            let filter = content_filter::from_settings(&settings.content_filter)?;
            let stats = recensor(&db, filter.as_ref(), dry_run)?;
            display_recensor_stats(&stats, dry_run);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_server::content_filter::WordListFilter;

    fn setup() -> (Database, i64, i64) {
        let db = Database::in_memory().expect("Failed to create in-memory database");
        db.initialize().expect("Failed to initialize database");

        let author = UserRepository::new(db.pool.clone())
            .create("alice", "hash")
            .unwrap();
        let posts = PostRepository::new(db.pool.clone());
        let post_id = posts.create(author, "old darn post").unwrap();
        posts.create(author, "clean post").unwrap();
        CommentRepository::new(db.pool.clone())
            .create(author, post_id, "darn it")
            .unwrap();

        (db, author, post_id)
    }

    fn filter() -> WordListFilter {
        WordListFilter::new(["darn"]).unwrap()
    }

    #[test]
    fn test_dry_run_counts_without_writing() {
        let (db, _, post_id) = setup();

        let stats = recensor(&db, &filter(), true).unwrap();
        assert_eq!(stats.posts_scanned, 2);
        assert_eq!(stats.posts_changed, 1);
        assert_eq!(stats.comments_changed, 1);

        let post = PostRepository::new(db.pool.clone()).get(post_id).unwrap();
        assert_eq!(post.text, "old darn post");
    }

    #[test]
    fn test_recensor_rewrites_and_is_idempotent() {
        let (db, _, post_id) = setup();

        let stats = recensor(&db, &filter(), false).unwrap();
        assert_eq!(stats.changed(), 2);
        assert!(stats.errors.is_empty());

        let post = PostRepository::new(db.pool.clone()).get(post_id).unwrap();
        assert_eq!(post.text, "old **** post");
        assert!(post.updated_at.is_none(), "rewrites are not user edits");

        let again = recensor(&db, &filter(), false).unwrap();
        assert_eq!(again.changed(), 0);
    }

    #[test]
    fn test_connect_rejects_missing_file() {
        let err = connect_database("/nonexistent/murmur.db").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
