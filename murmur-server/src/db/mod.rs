pub mod schema;
pub mod connection;
pub mod error;
pub mod repositories;
mod rows;
pub mod seed;

pub use connection::{fold_case, Database, DbPool};
pub use error::{StoreError, StoreResult};
pub(crate) use rows::to_db_time;
