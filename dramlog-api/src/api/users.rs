//! Per-user aggregates

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::db::tags::{self, TagCount};
use crate::db::{tastings, users};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Tag distribution across a user's tastings
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTagsResponse {
    pub results: Vec<TagCount>,
    /// Number of tastings the counts were taken from
    pub total_count: i64,
}

/// GET /users/:id/tags
pub async fn list_user_tags(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<UserTagsResponse>> {
    let mut conn = state.db.acquire().await?;
    if users::get_user(&mut conn, user_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("User {} not found", user_id)));
    }

    let results = tags::list_user_tags(&mut conn, user_id).await?;
    let total_count = tastings::count_user_tastings(&mut conn, user_id).await?;

    Ok(Json(UserTagsResponse {
        results,
        total_count,
    }))
}
