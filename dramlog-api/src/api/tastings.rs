//! Tasting endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use dramlog_common::db::Tasting;

use crate::api::auth::CurrentUser;
use crate::db::tastings;
use crate::error::{ApiError, ApiResult};
use crate::services::{TastingInput, TastingRecorder};
use crate::AppState;

/// POST /tastings
///
/// Records a tasting for the caller. 201 with the stored tasting; 400 for an
/// unknown bottle or out-of-range input; 409 for a duplicate in the same
/// minute.
pub async fn create_tasting(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<TastingInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Tasting>)> {
    let Json(input) = payload?;

    let recorder = TastingRecorder::new(state.db.clone(), state.event_bus.clone());
    let recorded = recorder.record(user.id(), input).await?;

    Ok((StatusCode::CREATED, Json(recorded.tasting)))
}

/// GET /tastings/:id
pub async fn get_tasting(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Tasting>> {
    let mut conn = state.db.acquire().await?;
    let tasting = tastings::get_tasting(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Tasting {} not found", id)))?;

    Ok(Json(tasting))
}
