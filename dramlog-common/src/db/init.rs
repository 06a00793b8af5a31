//! Database initialization
//!
//! Opens (or creates) the SQLite database, applies connection pragmas,
//! creates every table that does not exist yet and then runs versioned
//! migrations for databases created by older builds.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// How long a writer waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Pragmas go on the connect options so every pooled connection gets them,
    // not just the one that happens to run a PRAGMA statement.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_tables(&pool).await?;

    // Versioned migrations for databases created by older builds
    crate::db::migrations::run_migrations(&pool).await?;

    Ok(pool)
}

/// Create every table used by dramlog (idempotent)
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_users_table(pool).await?;

    // Catalog
    create_entity_table(pool).await?;
    create_bottle_table(pool).await?;
    create_bottle_distiller_table(pool).await?;

    // Tastings and aggregates
    create_tasting_table(pool).await?;
    create_bottle_tag_table(pool).await?;

    // Badges
    create_badge_table(pool).await?;
    create_badge_award_table(pool).await?;

    // Retail pricing
    create_store_table(pool).await?;
    create_store_price_table(pool).await?;
    create_store_price_history_table(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            api_key_hash TEXT NOT NULL UNIQUE,
            admin INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_entity_table(pool: &SqlitePool) -> Result<()> {
    // type is a JSON array of "brand" / "distiller" / "bottler"
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entity (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            type TEXT NOT NULL DEFAULT '[]',
            country TEXT,
            region TEXT,
            total_bottles INTEGER NOT NULL DEFAULT 0,
            total_tastings INTEGER NOT NULL DEFAULT 0,
            created_by_id INTEGER REFERENCES users(id),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_bottle_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bottle (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            brand_id INTEGER NOT NULL REFERENCES entity(id),
            category TEXT,
            stated_age INTEGER,
            total_tastings INTEGER NOT NULL DEFAULT 0,
            created_by_id INTEGER REFERENCES users(id),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_bottle_distiller_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bottle_distiller (
            bottle_id INTEGER NOT NULL REFERENCES bottle(id),
            distiller_id INTEGER NOT NULL REFERENCES entity(id),
            PRIMARY KEY (bottle_id, distiller_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_tasting_table(pool: &SqlitePool) -> Result<()> {
    // created_bucket is created_at truncated to the minute; the unique
    // constraint on it rejects duplicate submissions.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tasting (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bottle_id INTEGER NOT NULL REFERENCES bottle(id),
            created_by_id INTEGER NOT NULL REFERENCES users(id),
            notes TEXT,
            rating REAL CHECK (rating IS NULL OR (rating >= 0 AND rating <= 5)),
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TIMESTAMP NOT NULL,
            created_bucket INTEGER NOT NULL,
            CONSTRAINT tasting_unq UNIQUE (created_by_id, bottle_id, created_bucket)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_bottle_tag_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bottle_tag (
            bottle_id INTEGER NOT NULL REFERENCES bottle(id),
            tag TEXT NOT NULL,
            count INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (bottle_id, tag)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_badge_table(pool: &SqlitePool) -> Result<()> {
    // checks is a JSON array of {type, config} objects
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS badge (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            max_level INTEGER NOT NULL DEFAULT 25,
            checks TEXT NOT NULL DEFAULT '[]',
            image_url TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_badge_award_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS badge_award (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            badge_id INTEGER NOT NULL REFERENCES badge(id),
            user_id INTEGER NOT NULL REFERENCES users(id),
            xp INTEGER NOT NULL DEFAULT 0,
            level INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CONSTRAINT badge_award_unq UNIQUE (badge_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_store_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS store (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            type TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            country TEXT,
            last_run_at TIMESTAMP,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_store_price_table(pool: &SqlitePool) -> Result<()> {
    // price is stored in cents
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS store_price (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            store_id INTEGER NOT NULL REFERENCES store(id),
            name TEXT NOT NULL,
            bottle_id INTEGER REFERENCES bottle(id),
            price INTEGER NOT NULL,
            url TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CONSTRAINT store_price_unq_name UNIQUE (store_id, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_store_price_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS store_price_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            price_id INTEGER NOT NULL REFERENCES store_price(id),
            price INTEGER NOT NULL,
            date TEXT NOT NULL,
            CONSTRAINT store_price_history_unq UNIQUE (price_id, date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
