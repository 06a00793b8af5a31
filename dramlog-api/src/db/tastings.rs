//! Tasting queries

use chrono::{DateTime, Utc};
use dramlog_common::db::Tasting;
use dramlog_common::time::tasting_bucket;
use dramlog_common::{is_unique_violation, Error, Result};
use sqlx::types::Json;
use sqlx::SqliteConnection;

const TASTING_COLUMNS: &str = "id, bottle_id, created_by_id, notes, rating, tags, created_at";

/// A validated tasting ready to insert
#[derive(Debug, Clone)]
pub struct NewTasting {
    pub bottle_id: i64,
    pub created_by_id: i64,
    pub notes: Option<String>,
    pub rating: Option<f64>,
    /// Already normalized
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert a tasting
///
/// A second tasting of the same bottle by the same user in the same minute
/// bucket is rejected with `Conflict`.
pub async fn insert_tasting(conn: &mut SqliteConnection, tasting: &NewTasting) -> Result<Tasting> {
    let inserted = sqlx::query_as::<_, Tasting>(&format!(
        r#"
        INSERT INTO tasting (bottle_id, created_by_id, notes, rating, tags, created_at, created_bucket)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        TASTING_COLUMNS
    ))
    .bind(tasting.bottle_id)
    .bind(tasting.created_by_id)
    .bind(&tasting.notes)
    .bind(tasting.rating)
    .bind(Json(&tasting.tags))
    .bind(tasting.created_at)
    .bind(tasting_bucket(tasting.created_at))
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::Conflict("Tasting already exists".to_string())
        } else {
            e.into()
        }
    })?;

    Ok(inserted)
}

pub async fn get_tasting(conn: &mut SqliteConnection, id: i64) -> Result<Option<Tasting>> {
    let tasting = sqlx::query_as::<_, Tasting>(&format!(
        "SELECT {} FROM tasting WHERE id = ?",
        TASTING_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(tasting)
}

pub async fn count_bottle_tastings(conn: &mut SqliteConnection, bottle_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasting WHERE bottle_id = ?")
        .bind(bottle_id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}

pub async fn count_user_tastings(conn: &mut SqliteConnection, user_id: i64) -> Result<i64> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tasting WHERE created_by_id = ?")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;

    Ok(count)
}

/// Tastings of a bottle, newest first
pub async fn list_bottle_tastings(
    conn: &mut SqliteConnection,
    bottle_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Tasting>> {
    let tastings = sqlx::query_as::<_, Tasting>(&format!(
        r#"
        SELECT {}
        FROM tasting
        WHERE bottle_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
        TASTING_COLUMNS
    ))
    .bind(bottle_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await?;

    Ok(tastings)
}
