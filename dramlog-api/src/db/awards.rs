//! Badge award ledger

use chrono::Utc;
use dramlog_common::badges::{level_for_xp, Badge, XP_PER_LEVEL};
use dramlog_common::db::BadgeAward;
use dramlog_common::Result;
use serde::Serialize;
use sqlx::SqliteConnection;

use super::badges;

const AWARD_COLUMNS: &str = "id, badge_id, user_id, xp, level, created_at, updated_at";

/// An award together with the badge it is for
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardWithBadge {
    #[serde(flatten)]
    pub award: BadgeAward,
    pub badge: Badge,
}

/// Add one xp to the (badge, user) award, creating it at xp 1
///
/// The level is recomputed in the same statement from the new xp.
pub async fn increment_award(
    conn: &mut SqliteConnection,
    badge_id: i64,
    user_id: i64,
) -> Result<BadgeAward> {
    let now = Utc::now();

    let award = sqlx::query_as::<_, BadgeAward>(&format!(
        r#"
        INSERT INTO badge_award (badge_id, user_id, xp, level, created_at, updated_at)
        VALUES (?, ?, 1, ?, ?, ?)
        ON CONFLICT (badge_id, user_id) DO UPDATE SET
            xp = badge_award.xp + 1,
            level = (badge_award.xp + 1) / ? + 1,
            updated_at = excluded.updated_at
        RETURNING {}
        "#,
        AWARD_COLUMNS
    ))
    .bind(badge_id)
    .bind(user_id)
    .bind(level_for_xp(1))
    .bind(now)
    .bind(now)
    .bind(XP_PER_LEVEL)
    .fetch_one(&mut *conn)
    .await?;

    Ok(award)
}

/// Level the award had before its latest xp point (0 for a new award)
pub fn previous_level(award: &BadgeAward) -> i64 {
    if award.xp <= 1 {
        0
    } else {
        level_for_xp(award.xp - 1)
    }
}

/// A user's awards with their badges, by badge id
pub async fn list_user_awards(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Vec<AwardWithBadge>> {
    let awards = sqlx::query_as::<_, BadgeAward>(&format!(
        "SELECT {} FROM badge_award WHERE user_id = ? ORDER BY badge_id",
        AWARD_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    let all_badges = badges::list_badges(conn).await?;

    Ok(awards
        .into_iter()
        .filter_map(|award| {
            let badge = all_badges.iter().find(|b| b.id == award.badge_id)?.clone();
            Some(AwardWithBadge { award, badge })
        })
        .collect())
}
