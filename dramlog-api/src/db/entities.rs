//! Entity (brand, distiller, bottler) queries

use chrono::Utc;
use dramlog_common::db::{Entity, EntityType};
use dramlog_common::{is_unique_violation, Error, Result};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

const ENTITY_COLUMNS: &str =
    "id, name, type, country, region, total_bottles, total_tastings, created_at";

/// Payload for creating an entity
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntity {
    pub name: String,
    #[serde(rename = "type", default)]
    pub entity_type: Vec<EntityType>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

pub async fn get_entity(conn: &mut SqliteConnection, id: i64) -> Result<Option<Entity>> {
    let entity = sqlx::query_as::<_, Entity>(&format!(
        "SELECT {} FROM entity WHERE id = ?",
        ENTITY_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(entity)
}

/// Load several entities by id, ordered by id
pub async fn get_entities(conn: &mut SqliteConnection, ids: &[i64]) -> Result<Vec<Entity>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM entity WHERE id IN (",
        ENTITY_COLUMNS
    ));
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY id");

    let entities = query
        .build_query_as::<Entity>()
        .fetch_all(&mut *conn)
        .await?;

    Ok(entities)
}

pub async fn create_entity(
    conn: &mut SqliteConnection,
    input: NewEntity,
    user_id: i64,
) -> Result<Entity> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::InvalidInput("name is required".to_string()));
    }

    let mut entity_type: Vec<EntityType> = Vec::new();
    for t in input.entity_type {
        if !entity_type.contains(&t) {
            entity_type.push(t);
        }
    }

    let entity = sqlx::query_as::<_, Entity>(&format!(
        r#"
        INSERT INTO entity (name, type, country, region, created_by_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        ENTITY_COLUMNS
    ))
    .bind(&name)
    .bind(Json(&entity_type))
    .bind(&input.country)
    .bind(&input.region)
    .bind(user_id)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::Conflict(format!("Entity '{}' already exists", name))
        } else {
            e.into()
        }
    })?;

    Ok(entity)
}

/// Relative `total_tastings + 1` on every listed entity
pub async fn increment_total_tastings(conn: &mut SqliteConnection, ids: &[i64]) -> Result<()> {
    increment_counter(conn, "total_tastings", ids).await
}

/// Relative `total_bottles + 1` on every listed entity
pub async fn increment_total_bottles(conn: &mut SqliteConnection, ids: &[i64]) -> Result<()> {
    increment_counter(conn, "total_bottles", ids).await
}

async fn increment_counter(
    conn: &mut SqliteConnection,
    column: &'static str,
    ids: &[i64],
) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "UPDATE entity SET {column} = {column} + 1 WHERE id IN ("
    ));
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    query.build().execute(&mut *conn).await?;

    Ok(())
}
