//! Database models
//!
//! Rows decode directly through `sqlx::FromRow`; JSON columns (entity types,
//! tasting tags) use `#[sqlx(json)]`. Models serialize to camelCase for the
//! HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Role an entity plays for a bottle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Brand,
    Distiller,
    Bottler,
}

/// Spirit category of a bottle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Category {
    Blend,
    BlendedGrain,
    BlendedMalt,
    BlendedScotch,
    Bourbon,
    Rye,
    SingleGrain,
    SingleMalt,
    SinglePotStill,
    Spirit,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Blend,
        Category::BlendedGrain,
        Category::BlendedMalt,
        Category::BlendedScotch,
        Category::Bourbon,
        Category::Rye,
        Category::SingleGrain,
        Category::SingleMalt,
        Category::SinglePotStill,
        Category::Spirit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Blend => "blend",
            Category::BlendedGrain => "blended_grain",
            Category::BlendedMalt => "blended_malt",
            Category::BlendedScotch => "blended_scotch",
            Category::Bourbon => "bourbon",
            Category::Rye => "rye",
            Category::SingleGrain => "single_grain",
            Category::SingleMalt => "single_malt",
            Category::SinglePotStill => "single_pot_still",
            Category::Spirit => "spirit",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown category: {}", s)))
    }
}

/// A brand, distiller, or bottler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type", json)]
    pub entity_type: Vec<EntityType>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub total_bottles: i64,
    pub total_tastings: i64,
    pub created_at: DateTime<Utc>,
}

/// A bottle in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bottle {
    pub id: i64,
    pub name: String,
    pub brand_id: i64,
    pub category: Option<Category>,
    pub stated_age: Option<i64>,
    pub total_tastings: i64,
    pub created_at: DateTime<Utc>,
}

/// A bottle with its brand and distillers loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BottleWithRelations {
    #[serde(flatten)]
    pub bottle: Bottle,
    pub brand: Entity,
    pub distillers: Vec<Entity>,
}

impl BottleWithRelations {
    /// Brand plus distillers, de-duplicated by id, brand first
    pub fn implicated_entities(&self) -> Vec<&Entity> {
        let mut entities = vec![&self.brand];
        for distiller in &self.distillers {
            if !entities.iter().any(|e| e.id == distiller.id) {
                entities.push(distiller);
            }
        }
        entities
    }
}

/// A user's recorded tasting of a bottle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tasting {
    pub id: i64,
    pub bottle_id: i64,
    pub created_by_id: i64,
    pub notes: Option<String>,
    pub rating: Option<f64>,
    #[sqlx(json)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// How many tastings of a bottle carry a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BottleTag {
    pub bottle_id: i64,
    pub tag: String,
    pub count: i64,
}

/// Accumulated experience of one user on one badge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BadgeAward {
    pub id: i64,
    pub badge_id: i64,
    pub user_id: i64,
    pub xp: i64,
    pub level: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An API user (the key hash is never loaded into this struct)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub admin: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A retailer whose prices are scraped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub store_type: String,
    pub name: String,
    pub country: Option<String>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Latest listed price of a product at a store, in cents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StorePrice {
    pub id: i64,
    pub store_id: i64,
    pub name: String,
    pub bottle_id: Option<i64>,
    pub price: i64,
    pub url: String,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: i64, name: &str) -> Entity {
        Entity {
            id,
            name: name.to_string(),
            entity_type: vec![EntityType::Distiller],
            country: None,
            region: None,
            total_bottles: 0,
            total_tastings: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_category_round_trips_through_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!("moonshine".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&Category::SingleMalt).unwrap();
        assert_eq!(json, "\"single_malt\"");
    }

    #[test]
    fn test_implicated_entities_dedupes_brand_distiller() {
        let brand = entity(1, "Ardbeg");
        let bottle = BottleWithRelations {
            bottle: Bottle {
                id: 10,
                name: "Ardbeg Ten".to_string(),
                brand_id: 1,
                category: Some(Category::SingleMalt),
                stated_age: Some(10),
                total_tastings: 0,
                created_at: Utc::now(),
            },
            brand: brand.clone(),
            distillers: vec![brand, entity(2, "Other")],
        };

        let ids: Vec<i64> = bottle.implicated_entities().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_entity_serializes_type_field() {
        let value = serde_json::to_value(entity(3, "Lagavulin")).unwrap();
        assert_eq!(value["type"], serde_json::json!(["distiller"]));
        assert_eq!(value["totalTastings"], 0);
    }
}
