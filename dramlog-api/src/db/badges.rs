//! Badge definitions

use chrono::Utc;
use dramlog_common::badges::{Badge, BadgeInput};
use dramlog_common::{is_unique_violation, Error, Result};
use sqlx::types::Json;
use sqlx::SqliteConnection;

const BADGE_COLUMNS: &str = "id, name, max_level, checks, image_url, created_at";

/// All badges in id order
pub async fn list_badges(conn: &mut SqliteConnection) -> Result<Vec<Badge>> {
    let badges = sqlx::query_as::<_, Badge>(&format!(
        "SELECT {} FROM badge ORDER BY id",
        BADGE_COLUMNS
    ))
    .fetch_all(&mut *conn)
    .await?;

    Ok(badges)
}

pub async fn get_badge(conn: &mut SqliteConnection, id: i64) -> Result<Option<Badge>> {
    let badge = sqlx::query_as::<_, Badge>(&format!(
        "SELECT {} FROM badge WHERE id = ?",
        BADGE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(badge)
}

/// Validate and store a badge definition
pub async fn create_badge(conn: &mut SqliteConnection, input: BadgeInput) -> Result<Badge> {
    let input = input.validate()?;

    let badge = sqlx::query_as::<_, Badge>(&format!(
        r#"
        INSERT INTO badge (name, max_level, checks, image_url, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        BADGE_COLUMNS
    ))
    .bind(&input.name)
    .bind(input.max_level)
    .bind(Json(&input.checks))
    .bind(&input.image_url)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::Conflict(format!("Badge '{}' already exists", input.name))
        } else {
            e.into()
        }
    })?;

    Ok(badge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;
    use dramlog_common::badges::{AgeCheckConfig, Check, DEFAULT_MAX_LEVEL};

    fn input(name: &str) -> BadgeInput {
        BadgeInput {
            name: name.to_string(),
            max_level: DEFAULT_MAX_LEVEL,
            checks: vec![Check::Age(AgeCheckConfig {
                min_age: Some(18),
                max_age: None,
            })],
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_badges() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let created = create_badge(&mut conn, input("Old Timer")).await.unwrap();
        assert_eq!(created.checks.len(), 1);

        let loaded = get_badge(&mut conn, created.id).await.unwrap().unwrap();
        assert_eq!(loaded.checks, created.checks);

        create_badge(&mut conn, input("Second")).await.unwrap();
        let all = list_badges(&mut conn).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_badge_name_conflicts() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        create_badge(&mut conn, input("Dup")).await.unwrap();
        let result = create_badge(&mut conn, input("Dup")).await;
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_invalid_badge_not_stored() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let mut bad = input("Empty");
        bad.checks.clear();
        assert!(matches!(
            create_badge(&mut conn, bad).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(list_badges(&mut conn).await.unwrap().is_empty());
    }
}
