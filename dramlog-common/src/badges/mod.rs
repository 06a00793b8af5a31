//! Badge rule engine
//!
//! A badge owns an ordered list of [`Check`]s. A tasting qualifies for a badge
//! only when every check passes. Evaluation is pure: it reads a denormalized
//! [`TastingWithRelations`] snapshot and never touches the database.
//!
//! Experience is tracked per (badge, user). The level is always derived from
//! xp with [`level_for_xp`]; it is never stored independently.

pub mod checks;

pub use checks::{
    AgeCheckConfig, BottleCheckConfig, CategoryCheckConfig, Check, EntityCheckConfig,
    EveryTastingCheckConfig, RegionCheckConfig,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{BottleWithRelations, Tasting};
use crate::{Error, Result};

/// Experience points required per badge level
pub const XP_PER_LEVEL: i64 = 5;

/// Default and bounds for `Badge::max_level`
pub const DEFAULT_MAX_LEVEL: i64 = 25;
pub const MAX_LEVEL_LIMIT: i64 = 100;

/// Level derived from accumulated xp: `floor(xp / XP_PER_LEVEL) + 1`
pub fn level_for_xp(xp: i64) -> i64 {
    xp / XP_PER_LEVEL + 1
}

/// A tasting with the bottle, brand and distillers it implicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TastingWithRelations {
    #[serde(flatten)]
    pub tasting: Tasting,
    pub bottle: BottleWithRelations,
}

/// A badge definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: i64,
    pub name: String,
    pub max_level: i64,
    #[sqlx(json)]
    pub checks: Vec<Check>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Badge {
    /// True when the badge has checks and all of them pass
    pub fn qualifies(&self, tasting: &TastingWithRelations) -> bool {
        !self.checks.is_empty() && self.checks.iter().all(|check| check.test(tasting))
    }
}

/// Badges the tasting qualifies for, in input order
pub fn check_badges<'a>(badges: &'a [Badge], tasting: &TastingWithRelations) -> Vec<&'a Badge> {
    badges.iter().filter(|badge| badge.qualifies(tasting)).collect()
}

/// Payload for defining a new badge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeInput {
    pub name: String,
    #[serde(default = "default_max_level")]
    pub max_level: i64,
    pub checks: Vec<Check>,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn default_max_level() -> i64 {
    DEFAULT_MAX_LEVEL
}

impl BadgeInput {
    /// Normalize the name and validate every check
    pub fn validate(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(Error::InvalidInput("name is required".to_string()));
        }
        if !(1..=MAX_LEVEL_LIMIT).contains(&self.max_level) {
            return Err(Error::InvalidInput(format!(
                "maxLevel must be between 1 and {}",
                MAX_LEVEL_LIMIT
            )));
        }
        if self.checks.is_empty() {
            return Err(Error::InvalidInput(
                "At least one check is required.".to_string(),
            ));
        }
        for check in &self.checks {
            check.validate()?;
        }
        Ok(self)
    }
}
