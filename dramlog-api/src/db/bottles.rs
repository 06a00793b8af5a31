//! Bottle queries and the bottle/distiller link

use chrono::Utc;
use dramlog_common::db::{Bottle, BottleWithRelations, Category};
use dramlog_common::{is_foreign_key_violation, is_unique_violation, Error, Result};
use serde::Deserialize;
use sqlx::SqliteConnection;

use super::entities;

const BOTTLE_COLUMNS: &str = "id, name, brand_id, category, stated_age, total_tastings, created_at";

/// Payload for creating a bottle
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBottle {
    pub name: String,
    /// Brand entity id
    pub brand: i64,
    /// Distiller entity ids
    #[serde(default)]
    pub distillers: Vec<i64>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub stated_age: Option<i64>,
}

pub async fn get_bottle(conn: &mut SqliteConnection, id: i64) -> Result<Option<Bottle>> {
    let bottle = sqlx::query_as::<_, Bottle>(&format!(
        "SELECT {} FROM bottle WHERE id = ?",
        BOTTLE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(bottle)
}

/// Case-insensitive exact name match
pub async fn find_bottle_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<Bottle>> {
    let bottle = sqlx::query_as::<_, Bottle>(&format!(
        "SELECT {} FROM bottle WHERE name = ? COLLATE NOCASE",
        BOTTLE_COLUMNS
    ))
    .bind(name.trim())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(bottle)
}

pub async fn get_distiller_ids(conn: &mut SqliteConnection, bottle_id: i64) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT distiller_id FROM bottle_distiller WHERE bottle_id = ? ORDER BY distiller_id",
    )
    .bind(bottle_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ids)
}

/// Attach brand and distillers to an already loaded bottle
///
/// A missing brand row means the catalog is inconsistent and is reported as
/// `Internal`.
pub async fn load_relations(
    conn: &mut SqliteConnection,
    bottle: Bottle,
) -> Result<BottleWithRelations> {
    let brand = entities::get_entity(conn, bottle.brand_id)
        .await?
        .ok_or_else(|| {
            Error::Internal(format!(
                "Brand {} of bottle {} is missing",
                bottle.brand_id, bottle.id
            ))
        })?;

    let distiller_ids = get_distiller_ids(conn, bottle.id).await?;
    let distillers = entities::get_entities(conn, &distiller_ids).await?;

    Ok(BottleWithRelations {
        bottle,
        brand,
        distillers,
    })
}

pub async fn get_bottle_with_relations(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<BottleWithRelations>> {
    match get_bottle(conn, id).await? {
        Some(bottle) => Ok(Some(load_relations(conn, bottle).await?)),
        None => Ok(None),
    }
}

/// Relative `total_tastings + 1`
pub async fn increment_total_tastings(conn: &mut SqliteConnection, bottle_id: i64) -> Result<()> {
    let result = sqlx::query("UPDATE bottle SET total_tastings = total_tastings + 1 WHERE id = ?")
        .bind(bottle_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() != 1 {
        return Err(Error::Internal(format!(
            "Bottle {} vanished while recording a tasting",
            bottle_id
        )));
    }

    Ok(())
}

/// Insert a bottle with its distiller links and bump `total_bottles` on
/// every implicated entity
///
/// Run inside a transaction; the caller commits.
pub async fn create_bottle(
    conn: &mut SqliteConnection,
    input: NewBottle,
    user_id: i64,
) -> Result<BottleWithRelations> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::InvalidInput("name is required".to_string()));
    }
    if input.stated_age.is_some_and(|age| age < 0) {
        return Err(Error::InvalidInput(
            "statedAge must not be negative".to_string(),
        ));
    }

    let mut distiller_ids = input.distillers.clone();
    distiller_ids.sort_unstable();
    distiller_ids.dedup();

    // Insert first so the write lock is taken before any read. Unknown brand
    // and distiller ids surface as foreign key violations.
    let bottle = sqlx::query_as::<_, Bottle>(&format!(
        r#"
        INSERT INTO bottle (name, brand_id, category, stated_age, created_by_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        BOTTLE_COLUMNS
    ))
    .bind(&name)
    .bind(input.brand)
    .bind(input.category)
    .bind(input.stated_age)
    .bind(user_id)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::Conflict(format!("Bottle '{}' already exists", name))
        } else if is_foreign_key_violation(&e) {
            Error::InvalidInput(format!("Unknown brand: {}", input.brand))
        } else {
            e.into()
        }
    })?;

    for distiller_id in &distiller_ids {
        sqlx::query("INSERT INTO bottle_distiller (bottle_id, distiller_id) VALUES (?, ?)")
            .bind(bottle.id)
            .bind(*distiller_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    Error::InvalidInput(format!("Unknown distiller: {}", distiller_id))
                } else {
                    e.into()
                }
            })?;
    }

    let bottle = load_relations(conn, bottle).await?;
    let entity_ids: Vec<i64> = bottle.implicated_entities().iter().map(|e| e.id).collect();
    entities::increment_total_bottles(conn, &entity_ids).await?;

    tracing::debug!(
        bottle_id = bottle.bottle.id,
        entities = ?entity_ids,
        "Created bottle"
    );

    Ok(bottle)
}
