//! Badge check kinds
//!
//! Each check is a pure predicate over a [`TastingWithRelations`]. The set of
//! kinds is closed: adding one means adding a variant to [`Check`] and an arm
//! to its `match` blocks, nothing else.
//!
//! Wire format is `{"type": "<kind>", "config": {...}}`. A missing or null
//! `config` reads as `{}`.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

use super::TastingWithRelations;
use crate::db::{Category, EntityType};
use crate::{Error, Result};

/// A single badge eligibility predicate and its configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "config", rename_all = "camelCase")]
pub enum Check {
    Age(AgeCheckConfig),
    Entity(EntityCheckConfig),
    Bottle(BottleCheckConfig),
    Region(RegionCheckConfig),
    Category(CategoryCheckConfig),
    EveryTasting(EveryTastingCheckConfig),
}

impl Check {
    /// Evaluate this check against a tasting
    pub fn test(&self, tasting: &TastingWithRelations) -> bool {
        match self {
            Check::Age(config) => config.test(tasting),
            Check::Entity(config) => config.test(tasting),
            Check::Bottle(config) => config.test(tasting),
            Check::Region(config) => config.test(tasting),
            Check::Category(config) => config.test(tasting),
            Check::EveryTasting(_) => true,
        }
    }

    /// Reject configurations that can never be satisfied or are malformed
    pub fn validate(&self) -> Result<()> {
        match self {
            Check::Age(config) => config.validate(),
            Check::Entity(config) => config.validate(),
            Check::Bottle(config) => config.validate(),
            Check::Region(config) => config.validate(),
            Check::Category(config) => config.validate(),
            Check::EveryTasting(_) => Ok(()),
        }
    }
}

/// Every `type` accepted on the wire
const CHECK_KINDS: &[&str] = &["age", "entity", "bottle", "region", "category", "everyTasting"];

impl<'de> Deserialize<'de> for Check {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Tagged {
            #[serde(rename = "type")]
            kind: String,
            #[serde(default)]
            config: Option<serde_json::Value>,
        }

        fn config<T: DeserializeOwned, E: de::Error>(
            value: serde_json::Value,
        ) -> std::result::Result<T, E> {
            serde_json::from_value(value).map_err(E::custom)
        }

        let tagged = Tagged::deserialize(deserializer)?;
        let value = tagged
            .config
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

        match tagged.kind.as_str() {
            "age" => config(value).map(Check::Age),
            "entity" => config(value).map(Check::Entity),
            "bottle" => config(value).map(Check::Bottle),
            "region" => config(value).map(Check::Region),
            "category" => config(value).map(Check::Category),
            "everyTasting" => config(value).map(Check::EveryTasting),
            other => Err(de::Error::unknown_variant(other, CHECK_KINDS)),
        }
    }
}

/// Stated age within an inclusive range; either bound may be omitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeCheckConfig {
    #[serde(default)]
    pub min_age: Option<i64>,
    #[serde(default)]
    pub max_age: Option<i64>,
}

impl AgeCheckConfig {
    fn test(&self, tasting: &TastingWithRelations) -> bool {
        let Some(age) = tasting.bottle.bottle.stated_age else {
            return false;
        };
        self.min_age.map_or(true, |min| age >= min) && self.max_age.map_or(true, |max| age <= max)
    }

    fn validate(&self) -> Result<()> {
        if self.min_age.is_some_and(|v| v < 0) || self.max_age.is_some_and(|v| v < 0) {
            return Err(Error::InvalidInput("age bounds must be non-negative".to_string()));
        }
        if let (Some(min), Some(max)) = (self.min_age, self.max_age) {
            if min > max {
                return Err(Error::InvalidInput(format!(
                    "minAge ({}) is greater than maxAge ({})",
                    min, max
                )));
            }
        }
        Ok(())
    }
}

/// Brand or any distiller matches by id or (case-insensitive) name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCheckConfig {
    #[serde(default)]
    pub entity_ids: Vec<i64>,
    #[serde(default)]
    pub names: Vec<String>,
    /// When set, the matched entity must also be declared as this type
    #[serde(default, rename = "type")]
    pub entity_type: Option<EntityType>,
}

impl EntityCheckConfig {
    fn test(&self, tasting: &TastingWithRelations) -> bool {
        tasting.bottle.implicated_entities().into_iter().any(|entity| {
            let identified = self.entity_ids.contains(&entity.id)
                || self.names.iter().any(|n| n.eq_ignore_ascii_case(&entity.name));
            let typed = self
                .entity_type
                .map_or(true, |t| entity.entity_type.contains(&t));
            identified && typed
        })
    }

    fn validate(&self) -> Result<()> {
        if self.entity_ids.is_empty() && self.names.iter().all(|n| n.trim().is_empty()) {
            return Err(Error::InvalidInput(
                "entity check requires entityIds or names".to_string(),
            ));
        }
        Ok(())
    }
}

/// Bottle id in a fixed set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BottleCheckConfig {
    #[serde(default)]
    pub bottle_ids: Vec<i64>,
}

impl BottleCheckConfig {
    fn test(&self, tasting: &TastingWithRelations) -> bool {
        self.bottle_ids.contains(&tasting.bottle.bottle.id)
    }

    fn validate(&self) -> Result<()> {
        if self.bottle_ids.is_empty() {
            return Err(Error::InvalidInput("bottle check requires bottleIds".to_string()));
        }
        Ok(())
    }
}

/// Some implicated entity is located in the configured country (and region)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionCheckConfig {
    pub country: String,
    #[serde(default)]
    pub region: Option<String>,
}

impl RegionCheckConfig {
    fn test(&self, tasting: &TastingWithRelations) -> bool {
        tasting.bottle.implicated_entities().into_iter().any(|entity| {
            let country_matches = entity
                .country
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(&self.country));
            let region_matches = match &self.region {
                Some(region) => entity
                    .region
                    .as_deref()
                    .is_some_and(|r| r.eq_ignore_ascii_case(region)),
                None => true,
            };
            country_matches && region_matches
        })
    }

    fn validate(&self) -> Result<()> {
        if self.country.trim().is_empty() {
            return Err(Error::InvalidInput("region check requires country".to_string()));
        }
        Ok(())
    }
}

/// Bottle category in a fixed set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCheckConfig {
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl CategoryCheckConfig {
    fn test(&self, tasting: &TastingWithRelations) -> bool {
        tasting
            .bottle
            .bottle
            .category
            .is_some_and(|c| self.categories.contains(&c))
    }

    fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(Error::InvalidInput(
                "category check requires categories".to_string(),
            ));
        }
        Ok(())
    }
}

/// Matches every tasting; carries no configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EveryTastingCheckConfig {}
