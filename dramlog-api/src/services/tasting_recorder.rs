//! Tasting submission
//!
//! Records a tasting and everything that follows from it as one unit of work:
//! the tasting row, bottle and entity counters, tag counts and badge awards.
//! Either all of it commits or none of it does. The `TastingCreated` event is
//! published only after commit.

use chrono::{DateTime, Utc};
use dramlog_common::badges::{check_badges, TastingWithRelations};
use dramlog_common::db::{Bottle, Tasting};
use dramlog_common::events::{AwardProgress, DramlogEvent, EventBus};
use dramlog_common::time::{is_distant_future, is_distant_past};
use dramlog_common::{Error, Result};
use serde::Deserialize;
use sqlx::{Pool, Sqlite, SqliteConnection};

use crate::db::tastings::NewTasting;
use crate::db::{awards, badges, bottles, entities, tags, tastings};

/// How far ahead of the server clock a client `createdAt` may be
pub const MAX_FUTURE_SECONDS: i64 = 60 * 5;

/// How far behind the server clock a client `createdAt` may be
pub const MAX_PAST_SECONDS: i64 = 60 * 60 * 24 * 7;

/// Highest allowed rating
pub const MAX_RATING: f64 = 5.0;

/// `POST /tastings` body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TastingInput {
    /// Bottle id
    pub bottle: i64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A committed tasting and the award progress it caused
#[derive(Debug, Clone)]
pub struct RecordedTasting {
    pub tasting: Tasting,
    pub awards: Vec<AwardProgress>,
}

/// Trim, lowercase and de-duplicate tags, dropping empty ones
///
/// First occurrence wins, so the stored order follows the client's order.
pub fn normalize_tags(raw: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

/// Reject a client timestamp outside `[now - 7 days, now + 5 minutes]`
pub fn validate_created_at(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if is_distant_future(created_at, MAX_FUTURE_SECONDS, now) {
        return Err(Error::InvalidInput(
            "createdAt too far in future".to_string(),
        ));
    }
    if is_distant_past(created_at, MAX_PAST_SECONDS, now) {
        return Err(Error::InvalidInput("createdAt too far in past".to_string()));
    }
    Ok(())
}

fn validate_rating(rating: Option<f64>) -> Result<()> {
    match rating {
        Some(r) if !r.is_finite() || !(0.0..=MAX_RATING).contains(&r) => Err(
            Error::InvalidInput(format!("rating must be between 0 and {}", MAX_RATING)),
        ),
        _ => Ok(()),
    }
}

/// Tasting recorder
pub struct TastingRecorder {
    db: Pool<Sqlite>,
    event_bus: EventBus,
}

impl TastingRecorder {
    pub fn new(db: Pool<Sqlite>, event_bus: EventBus) -> Self {
        Self { db, event_bus }
    }

    /// Record a tasting for `user_id`
    ///
    /// **Algorithm:**
    /// 1. Resolve the bottle (unknown bottle is `InvalidInput`)
    /// 2. Validate createdAt and rating, normalize tags
    /// 3. Begin transaction
    /// 4. Insert tasting (duplicate bucket is `Conflict`)
    /// 5. Bump bottle and implicated entity counters
    /// 6. Upsert tag counts
    /// 7. Evaluate badges against the snapshot and upsert awards
    /// 8. Commit, then publish `TastingCreated`
    ///
    /// Any error before commit drops the transaction, which rolls it back.
    pub async fn record(&self, user_id: i64, input: TastingInput) -> Result<RecordedTasting> {
        let now = Utc::now();

        let bottle = {
            let mut conn = self.db.acquire().await?;
            bottles::get_bottle(&mut conn, input.bottle)
                .await?
                .ok_or_else(|| Error::InvalidInput("Could not identify bottle".to_string()))?
        };

        if let Some(created_at) = input.created_at {
            validate_created_at(created_at, now)?;
        }
        validate_rating(input.rating)?;

        let new_tasting = NewTasting {
            bottle_id: bottle.id,
            created_by_id: user_id,
            notes: input
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            rating: input.rating,
            tags: normalize_tags(input.tags.as_deref().unwrap_or_default()),
            created_at: input.created_at.unwrap_or(now),
        };

        tracing::debug!(
            bottle_id = bottle.id,
            user_id,
            tags = new_tasting.tags.len(),
            "Recording tasting"
        );

        let mut tx = self.db.begin().await?;
        let recorded = apply_tasting(&mut tx, bottle, &new_tasting).await?;
        tx.commit().await?;

        tracing::info!(
            tasting_id = recorded.tasting.id,
            bottle_id = recorded.tasting.bottle_id,
            user_id,
            awards = recorded.awards.len(),
            "Tasting recorded"
        );

        self.event_bus.emit_lossy(DramlogEvent::TastingCreated {
            tasting_id: recorded.tasting.id,
            bottle_id: recorded.tasting.bottle_id,
            user_id,
            awards: recorded.awards.clone(),
            timestamp: Utc::now(),
        });

        Ok(recorded)
    }
}

/// Transactional body of a tasting submission
async fn apply_tasting(
    conn: &mut SqliteConnection,
    bottle: Bottle,
    new_tasting: &NewTasting,
) -> Result<RecordedTasting> {
    let tasting = tastings::insert_tasting(conn, new_tasting).await?;

    bottles::increment_total_tastings(conn, bottle.id).await?;

    let bottle = bottles::load_relations(conn, bottle).await?;
    let entity_ids: Vec<i64> = bottle.implicated_entities().iter().map(|e| e.id).collect();
    entities::increment_total_tastings(conn, &entity_ids).await?;

    for tag in &tasting.tags {
        tags::increment_bottle_tag(conn, tasting.bottle_id, tag).await?;
    }

    let snapshot = TastingWithRelations {
        tasting: tasting.clone(),
        bottle,
    };
    let all_badges = badges::list_badges(conn).await?;
    let qualified = check_badges(&all_badges, &snapshot);

    let mut progress = Vec::with_capacity(qualified.len());
    for badge in qualified {
        let award = awards::increment_award(conn, badge.id, tasting.created_by_id).await?;
        let award_progress = AwardProgress {
            badge_id: badge.id,
            badge_name: badge.name.clone(),
            xp: award.xp,
            level: award.level,
            prev_level: awards::previous_level(&award),
        };
        if award_progress.leveled_up() {
            tracing::debug!(
                badge_id = badge.id,
                user_id = tasting.created_by_id,
                level = award.level,
                "Badge level reached"
            );
        }
        progress.push(award_progress);
    }

    Ok(RecordedTasting {
        tasting,
        awards: progress,
    })
}
