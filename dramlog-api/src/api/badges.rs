//! Badge definitions and user awards

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use dramlog_common::badges::{Badge, BadgeInput};
use serde::Serialize;

use crate::api::auth::CurrentUser;
use crate::db::awards::{self, AwardWithBadge};
use crate::db::{badges, users};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct BadgeListResponse {
    pub results: Vec<Badge>,
}

#[derive(Debug, Serialize)]
pub struct AwardListResponse {
    pub results: Vec<AwardWithBadge>,
}

/// GET /badges
pub async fn list_badges(State(state): State<AppState>) -> ApiResult<Json<BadgeListResponse>> {
    let mut conn = state.db.acquire().await?;
    let results = badges::list_badges(&mut conn).await?;

    Ok(Json(BadgeListResponse { results }))
}

/// GET /badges/:id
pub async fn get_badge(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Badge>> {
    let mut conn = state.db.acquire().await?;
    let badge = badges::get_badge(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Badge {} not found", id)))?;

    Ok(Json(badge))
}

/// POST /badges (admin)
pub async fn create_badge(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<BadgeInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Badge>)> {
    user.require_admin()?;
    let Json(input) = payload?;

    let mut conn = state.db.acquire().await?;
    let badge = badges::create_badge(&mut conn, input).await?;

    tracing::info!(badge_id = badge.id, name = %badge.name, "Badge created");

    Ok((StatusCode::CREATED, Json(badge)))
}

/// GET /users/:id/awards
pub async fn list_user_awards(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<AwardListResponse>> {
    let mut conn = state.db.acquire().await?;
    if users::get_user(&mut conn, user_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("User {} not found", user_id)));
    }
    let results = awards::list_user_awards(&mut conn, user_id).await?;

    Ok(Json(AwardListResponse { results }))
}
