//! REST API module.
//!
//! Contains all API routes and handlers following the frontend contract.

mod auth;
mod cities;
mod news;
mod nko;

pub use auth::*;
pub use cities::*;
pub use news::*;
pub use nko::*;

use std::collections::HashSet;

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::OptionalIdentity;
use crate::db::FavoriteTarget;
use crate::errors::{AppError, FieldError};
use crate::filter::ListFilter;
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// JSON request body; malformed input is reported in the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Form-encoded request body with enveloped rejections.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(AppError))]
pub struct FormBody<T>(pub T);

/// Query string; a value of the wrong type is an invalid filter.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// Outcome of a favorite/unfavorite call.
#[derive(Debug, Serialize)]
pub struct FavoriteStatus {
    pub item_id: i64,
    pub favorited: bool,
    /// Whether this call changed anything
    pub changed: bool,
}

/// Restrict `filter` to the requester's favorites when `favorite=true`.
///
/// Without a resolved identity the restriction is an empty set, so the
/// listing is empty rather than unfiltered.
async fn with_favorite_scope(
    state: &AppState,
    filter: ListFilter,
    favorite: Option<bool>,
    identity: &OptionalIdentity,
    target: FavoriteTarget,
) -> Result<ListFilter, AppError> {
    if favorite != Some(true) {
        return Ok(filter);
    }

    let ids = match &identity.0 {
        Some(identity) => state.repo.favorite_ids(target, identity.user_id()).await?,
        None => {
            tracing::debug!("Favorite-only listing without identity, returning nothing");
            HashSet::new()
        }
    };
    Ok(filter.with_favorites(ids))
}

/// Required-text check shared by the create endpoints.
fn require_text(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "is required"));
    }
}
