//! Store price ingest
//!
//! Scrapers post a store's full listing in one batch. Each listing is matched
//! to a catalog bottle by name, its latest price is upserted, and the day's
//! price history point is recorded. The batch commits as a whole.

use chrono::Utc;
use dramlog_common::db::StorePrice;
use dramlog_common::events::{DramlogEvent, EventBus};
use dramlog_common::{Error, Result};
use serde::Deserialize;
use sqlx::{Pool, Sqlite};

use crate::db::{bottles, stores};

/// One scraped listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInput {
    pub name: String,
    /// Price in cents
    pub price: i64,
    pub url: String,
}

impl PriceInput {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("price name is required".to_string()));
        }
        if self.price < 0 {
            return Err(Error::InvalidInput(format!(
                "price for '{}' must not be negative",
                self.name.trim()
            )));
        }
        if self.url.trim().is_empty() {
            return Err(Error::InvalidInput(format!(
                "url for '{}' is required",
                self.name.trim()
            )));
        }
        Ok(())
    }
}

/// Price ingest
pub struct PriceIngest {
    db: Pool<Sqlite>,
    event_bus: EventBus,
}

impl PriceIngest {
    pub fn new(db: Pool<Sqlite>, event_bus: EventBus) -> Self {
        Self { db, event_bus }
    }

    /// Apply a scraped batch to `store_id`
    pub async fn ingest(&self, store_id: i64, items: Vec<PriceInput>) -> Result<Vec<StorePrice>> {
        for item in &items {
            item.validate()?;
        }

        let now = Utc::now();
        let today = now.date_naive();

        let mut tx = self.db.begin().await?;

        // Must be the first statement: a write takes the lock before any read
        if stores::touch_last_run(&mut tx, store_id, now).await?.is_none() {
            return Err(Error::NotFound(format!("Store {} not found", store_id)));
        }

        let mut prices = Vec::with_capacity(items.len());
        for item in &items {
            let name = item.name.trim();
            let bottle_id = bottles::find_bottle_by_name(&mut tx, name)
                .await?
                .map(|b| b.id);

            let price = stores::upsert_price(
                &mut tx,
                store_id,
                name,
                bottle_id,
                item.price,
                item.url.trim(),
                now,
            )
            .await?;
            stores::upsert_price_history(&mut tx, price.id, price.price, today).await?;

            prices.push(price);
        }

        tx.commit().await?;

        let matched = prices.iter().filter(|p| p.bottle_id.is_some()).count();
        tracing::info!(
            store_id,
            prices = prices.len(),
            matched,
            "Store prices ingested"
        );

        self.event_bus.emit_lossy(DramlogEvent::StorePricesUpdated {
            store_id,
            prices_updated: prices.len(),
            timestamp: Utc::now(),
        });

        Ok(prices)
    }
}
