//! Entity endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use dramlog_common::db::Entity;

use crate::api::auth::CurrentUser;
use crate::db::entities::{self, NewEntity};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /entities/:id
pub async fn get_entity(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Entity>> {
    let mut conn = state.db.acquire().await?;
    let entity = entities::get_entity(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Entity {} not found", id)))?;

    Ok(Json(entity))
}

/// POST /entities
pub async fn create_entity(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<NewEntity>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Entity>)> {
    let Json(input) = payload?;

    let mut conn = state.db.acquire().await?;
    let entity = entities::create_entity(&mut conn, input, user.id()).await?;

    tracing::info!(entity_id = entity.id, user_id = user.id(), "Entity created");

    Ok((StatusCode::CREATED, Json(entity)))
}
