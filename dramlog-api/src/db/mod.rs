//! Query layer for dramlog-api
//!
//! One module per table. Functions take `&mut SqliteConnection` so the same
//! query runs on a pooled connection or inside a transaction.

pub mod awards;
pub mod badges;
pub mod bottles;
pub mod entities;
pub mod stores;
pub mod tags;
pub mod tastings;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use sqlx::SqlitePool;
    use std::str::FromStr;

    /// Single-connection in-memory database with the full schema
    pub(crate) async fn memory_pool() -> SqlitePool {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        dramlog_common::db::create_tables(&pool).await.unwrap();
        dramlog_common::db::run_migrations(&pool).await.unwrap();
        pool
    }
}
