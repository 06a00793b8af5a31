//! Stores and scraped prices

use chrono::{DateTime, NaiveDate, Utc};
use dramlog_common::db::{Store, StorePrice};
use dramlog_common::{is_unique_violation, Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

const STORE_COLUMNS: &str = "id, type, name, country, last_run_at, created_at";
const PRICE_COLUMNS: &str = "id, store_id, name, bottle_id, price, url, updated_at";

/// Payload for registering a store
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStore {
    #[serde(rename = "type")]
    pub store_type: String,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
}

/// Latest price of a bottle at one store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BottlePrice {
    pub store_id: i64,
    pub store_name: String,
    pub name: String,
    pub price: i64,
    pub url: String,
    pub updated_at: DateTime<Utc>,
}

pub async fn create_store(conn: &mut SqliteConnection, input: NewStore) -> Result<Store> {
    let store_type = input.store_type.trim().to_lowercase();
    let name = input.name.trim().to_string();
    if store_type.is_empty() || name.is_empty() {
        return Err(Error::InvalidInput("type and name are required".to_string()));
    }

    let store = sqlx::query_as::<_, Store>(&format!(
        r#"
        INSERT INTO store (type, name, country, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING {}
        "#,
        STORE_COLUMNS
    ))
    .bind(&store_type)
    .bind(&name)
    .bind(&input.country)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::Conflict(format!("Store type '{}' already exists", store_type))
        } else {
            e.into()
        }
    })?;

    Ok(store)
}

/// Stamp `last_run_at` and return the store, `None` if it does not exist
///
/// Being a write, this takes the database write lock when it opens an
/// ingest transaction.
pub async fn touch_last_run(
    conn: &mut SqliteConnection,
    store_id: i64,
    at: DateTime<Utc>,
) -> Result<Option<Store>> {
    let store = sqlx::query_as::<_, Store>(&format!(
        "UPDATE store SET last_run_at = ? WHERE id = ? RETURNING {}",
        STORE_COLUMNS
    ))
    .bind(at)
    .bind(store_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(store)
}

/// Insert or refresh the listing `name` at a store
#[allow(clippy::too_many_arguments)]
pub async fn upsert_price(
    conn: &mut SqliteConnection,
    store_id: i64,
    name: &str,
    bottle_id: Option<i64>,
    price: i64,
    url: &str,
    at: DateTime<Utc>,
) -> Result<StorePrice> {
    let row = sqlx::query_as::<_, StorePrice>(&format!(
        r#"
        INSERT INTO store_price (store_id, name, bottle_id, price, url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (store_id, name) DO UPDATE SET
            bottle_id = excluded.bottle_id,
            price = excluded.price,
            url = excluded.url,
            updated_at = excluded.updated_at
        RETURNING {}
        "#,
        PRICE_COLUMNS
    ))
    .bind(store_id)
    .bind(name)
    .bind(bottle_id)
    .bind(price)
    .bind(url)
    .bind(at)
    .bind(at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row)
}

/// Record the day's price for a listing; a later run on the same day wins
pub async fn upsert_price_history(
    conn: &mut SqliteConnection,
    price_id: i64,
    price: i64,
    date: NaiveDate,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO store_price_history (price_id, price, date)
        VALUES (?, ?, ?)
        ON CONFLICT (price_id, date) DO UPDATE SET price = excluded.price
        "#,
    )
    .bind(price_id)
    .bind(price)
    .bind(date.format("%Y-%m-%d").to_string())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Latest prices for a bottle across stores, cheapest first
pub async fn list_bottle_prices(
    conn: &mut SqliteConnection,
    bottle_id: i64,
) -> Result<Vec<BottlePrice>> {
    let prices = sqlx::query_as::<_, BottlePrice>(
        r#"
        SELECT p.store_id, s.name AS store_name, p.name, p.price, p.url, p.updated_at
        FROM store_price p
        JOIN store s ON s.id = p.store_id
        WHERE p.bottle_id = ?
        ORDER BY p.price ASC, s.name ASC
        "#,
    )
    .bind(bottle_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(prices)
}
