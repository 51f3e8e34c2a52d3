//! Low-level SQLite database interactions.
//!
//! Plain functions over a `&mut SqliteConnection` rather than stateful structs. Callers obtain a connection
//! from the pool, or open a transaction and pass `&mut *tx`, without any other changes.
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod accompany;
pub mod options;
pub mod registrations;

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
