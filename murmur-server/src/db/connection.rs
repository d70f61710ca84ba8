use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::functions::FunctionFlags;
use std::path::Path;
use std::time::Duration;

use super::schema::SCHEMA;

/// SQLite in-memory database identifier
const MEMORY_DB_PATH: &str = ":memory:";

/// How long a connection waits on a locked database before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQL name of the Unicode case-folding function registered on every connection
pub const FOLD_FUNCTION: &str = "fold";

/// Case-fold text for comparisons; SQLite's `LOWER` and `NOCASE` only fold ASCII
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling support
#[derive(Clone, Debug)]
pub struct Database {
    pub pool: DbPool,
}

impl Database {
    /// Create a new database connection pool holding at most `pool_size` connections
    pub fn new<P: AsRef<Path>>(path: P, pool_size: u32) -> Result<Self> {
        let path = path.as_ref();
        if path.to_string_lossy().trim().eq_ignore_ascii_case(MEMORY_DB_PATH) {
            return Self::in_memory();
        }

        let manager = Self::configure(SqliteConnectionManager::file(path));
        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .build(manager)
            .context("Failed to create database connection pool")?;
        Ok(Self { pool })
    }

    /// Create an in-memory database (useful for testing)
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is
    /// pinned to a single connection.
    pub fn in_memory() -> Result<Self> {
        let manager = Self::configure(SqliteConnectionManager::memory());
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .context("Failed to create in-memory database pool")?;
        Ok(Self { pool })
    }

    fn configure(manager: SqliteConnectionManager) -> SqliteConnectionManager {
        manager.with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            conn.create_scalar_function(
                FOLD_FUNCTION,
                1,
                FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
                |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|text| fold_case(&text))),
            )?;
            conn.busy_timeout(BUSY_TIMEOUT)
        })
    }

    /// Initialize the database schema
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }
}
