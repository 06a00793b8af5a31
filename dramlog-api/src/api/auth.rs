//! Identity middleware
//!
//! Protected routes require `Authorization: Bearer <apiKey>`. The key is
//! resolved against the users table and the caller is attached to the
//! request as [`CurrentUser`]. Public routes do not use this middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use dramlog_common::auth::parse_bearer;
use dramlog_common::db::User;
use tracing::debug;

use crate::db::users;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Authenticated caller, available to handlers as `Extension<CurrentUser>`
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }

    /// Forbidden unless the caller is an admin
    pub fn require_admin(&self) -> ApiResult<()> {
        if self.0.admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin access required".to_string()))
        }
    }
}

/// Authentication middleware
///
/// Missing, malformed, unknown or inactive keys are rejected with 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    let api_key = parse_bearer(header)
        .ok_or_else(|| ApiError::Unauthorized("Malformed Authorization header".to_string()))?;

    let mut conn = state.db.acquire().await?;
    let user = users::find_active_user_by_key(&mut conn, api_key)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid API key".to_string()))?;
    drop(conn);

    debug!(user_id = user.id, path = %request.uri().path(), "Authenticated request");

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
