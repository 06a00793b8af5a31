//! User accounts and API key lookup

use chrono::Utc;
use dramlog_common::auth::{generate_api_key, hash_api_key};
use dramlog_common::db::User;
use dramlog_common::{is_unique_violation, Error, Result};
use sqlx::SqliteConnection;

/// Create a user and return it with its freshly generated API key
///
/// The plaintext key is only available here; the database keeps its hash.
pub async fn create_user(
    conn: &mut SqliteConnection,
    username: &str,
    admin: bool,
) -> Result<(User, String)> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::InvalidInput("username is required".to_string()));
    }

    let api_key = generate_api_key();

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, api_key_hash, admin, active, created_at)
        VALUES (?, ?, ?, 1, ?)
        RETURNING id, username, admin, active, created_at
        "#,
    )
    .bind(username)
    .bind(hash_api_key(&api_key))
    .bind(admin)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::Conflict(format!("User '{}' already exists", username))
        } else {
            e.into()
        }
    })?;

    Ok((user, api_key))
}

/// Active user owning the given plaintext API key
pub async fn find_active_user_by_key(
    conn: &mut SqliteConnection,
    api_key: &str,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, admin, active, created_at
        FROM users
        WHERE api_key_hash = ? AND active = 1
        "#,
    )
    .bind(hash_api_key(api_key))
    .fetch_optional(&mut *conn)
    .await?;

    Ok(user)
}

pub async fn get_user(conn: &mut SqliteConnection, id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, admin, active, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(user)
}
