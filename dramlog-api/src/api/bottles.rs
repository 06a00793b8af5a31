//! Bottle endpoints: catalog, tastings, tag distribution and prices

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use dramlog_common::db::{BottleWithRelations, Tasting};
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::api::auth::CurrentUser;
use crate::db::bottles::{self, NewBottle};
use crate::db::stores::{self, BottlePrice};
use crate::db::tags::{self, TagCount};
use crate::db::tastings;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, Page, PageQuery};
use crate::AppState;

/// Tag distribution of a bottle
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BottleTagsResponse {
    pub bottle_id: i64,
    pub total_tastings: i64,
    pub tags: Vec<TagCount>,
}

#[derive(Debug, Serialize)]
pub struct BottlePricesResponse {
    pub results: Vec<BottlePrice>,
}

async fn require_bottle(
    conn: &mut SqliteConnection,
    id: i64,
) -> ApiResult<dramlog_common::db::Bottle> {
    bottles::get_bottle(conn, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Bottle {} not found", id)))
}

/// GET /bottles/:id
pub async fn get_bottle(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<BottleWithRelations>> {
    let mut conn = state.db.acquire().await?;
    let bottle = bottles::get_bottle_with_relations(&mut conn, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Bottle {} not found", id)))?;

    Ok(Json(bottle))
}

/// POST /bottles
///
/// Creates the bottle and its distiller links, and counts it on every
/// implicated entity, in one transaction.
pub async fn create_bottle(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<NewBottle>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BottleWithRelations>)> {
    let Json(input) = payload?;

    let mut tx = state.db.begin().await?;
    let bottle = bottles::create_bottle(&mut tx, input, user.id()).await?;
    tx.commit().await?;

    tracing::info!(
        bottle_id = bottle.bottle.id,
        user_id = user.id(),
        "Bottle created"
    );

    Ok((StatusCode::CREATED, Json(bottle)))
}

/// GET /bottles/:id/tastings?page=&perPage=
///
/// Newest first.
pub async fn list_bottle_tastings(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Tasting>>> {
    let mut conn = state.db.acquire().await?;
    require_bottle(&mut conn, id).await?;

    let total = tastings::count_bottle_tastings(&mut conn, id).await?;
    let pagination = calculate_pagination(total, query);
    let results =
        tastings::list_bottle_tastings(&mut conn, id, pagination.per_page, pagination.offset)
            .await?;

    Ok(Json(Page {
        results,
        pagination,
    }))
}

/// GET /bottles/:id/tags
pub async fn get_bottle_tags(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<BottleTagsResponse>> {
    let mut conn = state.db.acquire().await?;
    let bottle = require_bottle(&mut conn, id).await?;
    let tags = tags::list_bottle_tags(&mut conn, id).await?;

    Ok(Json(BottleTagsResponse {
        bottle_id: bottle.id,
        total_tastings: bottle.total_tastings,
        tags: tags.into_iter().map(TagCount::from).collect(),
    }))
}

/// GET /bottles/:id/prices
pub async fn get_bottle_prices(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<BottlePricesResponse>> {
    let mut conn = state.db.acquire().await?;
    require_bottle(&mut conn, id).await?;
    let results = stores::list_bottle_prices(&mut conn, id).await?;

    Ok(Json(BottlePricesResponse { results }))
}
