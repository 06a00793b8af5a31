//! Tag counters per bottle and tag distribution per user

use dramlog_common::db::BottleTag;
use dramlog_common::Result;
use serde::Serialize;
use sqlx::SqliteConnection;

/// A tag and how often it was used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

impl From<BottleTag> for TagCount {
    fn from(tag: BottleTag) -> Self {
        Self {
            tag: tag.tag,
            count: tag.count,
        }
    }
}

/// Count one more use of `tag` on a bottle
pub async fn increment_bottle_tag(
    conn: &mut SqliteConnection,
    bottle_id: i64,
    tag: &str,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO bottle_tag (bottle_id, tag, count)
        VALUES (?, ?, 1)
        ON CONFLICT (bottle_id, tag) DO UPDATE SET count = bottle_tag.count + 1
        "#,
    )
    .bind(bottle_id)
    .bind(tag)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Tags of a bottle, most used first
pub async fn list_bottle_tags(conn: &mut SqliteConnection, bottle_id: i64) -> Result<Vec<BottleTag>> {
    let tags = sqlx::query_as::<_, BottleTag>(
        r#"
        SELECT bottle_id, tag, count
        FROM bottle_tag
        WHERE bottle_id = ?
        ORDER BY count DESC, tag ASC
        "#,
    )
    .bind(bottle_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(tags)
}

/// Tags across all of a user's tastings, most used first
///
/// Computed from the tastings' own tag lists rather than a stored counter.
pub async fn list_user_tags(conn: &mut SqliteConnection, user_id: i64) -> Result<Vec<TagCount>> {
    let tags = sqlx::query_as::<_, TagCount>(
        r#"
        SELECT t.value AS tag, COUNT(*) AS count
        FROM tasting, json_each(tasting.tags) AS t
        WHERE tasting.created_by_id = ?
        GROUP BY t.value
        ORDER BY count DESC, tag ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(tags)
}
