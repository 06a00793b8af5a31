//! Store registration and price ingest (admin only)

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use dramlog_common::db::{Store, StorePrice};
use serde::Serialize;

use crate::api::auth::CurrentUser;
use crate::db::stores::{self, NewStore};
use crate::error::ApiResult;
use crate::services::{PriceIngest, PriceInput};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PriceIngestResponse {
    pub results: Vec<StorePrice>,
}

/// POST /stores
pub async fn create_store(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<NewStore>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Store>)> {
    user.require_admin()?;
    let Json(input) = payload?;

    let mut conn = state.db.acquire().await?;
    let store = stores::create_store(&mut conn, input).await?;

    tracing::info!(store_id = store.id, store_type = %store.store_type, "Store created");

    Ok((StatusCode::CREATED, Json(store)))
}

/// POST /stores/:id/prices
///
/// Body is the full scraped listing: `[{name, price, url}, ...]`.
pub async fn ingest_prices(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(store_id): Path<i64>,
    payload: Result<Json<Vec<PriceInput>>, JsonRejection>,
) -> ApiResult<Json<PriceIngestResponse>> {
    user.require_admin()?;
    let Json(items) = payload?;

    let ingest = PriceIngest::new(state.db.clone(), state.event_bus.clone());
    let results = ingest.ingest(store_id, items).await?;

    Ok(Json(PriceIngestResponse { results }))
}
