//! Organization (NKO) API endpoints.

use axum::extract::{Path, State};

use super::{
    require_text, success, with_favorite_scope, ApiResult, FavoriteStatus, JsonBody, QueryParams,
};
use crate::auth::{Identity, OptionalIdentity};
use crate::db::FavoriteTarget;
use crate::errors::{AppError, FieldError};
use crate::filter::ListFilter;
use crate::models::{Category, CreateNkoRequest, Nko, NkoQuery};
use crate::AppState;

/// GET /api/nko - List organizations matching the query filters.
pub async fn list_nko(
    State(state): State<AppState>,
    identity: OptionalIdentity,
    QueryParams(params): QueryParams<NkoQuery>,
) -> ApiResult<Vec<Nko>> {
    let filter = ListFilter::new(
        params.city.as_deref(),
        params.category.as_deref(),
        params.regex.as_deref(),
    )?;
    let filter =
        with_favorite_scope(&state, filter, params.favorite, &identity, FavoriteTarget::Nko)
            .await?;

    let items = state.repo.list_nko().await?;
    success(filter.apply(items))
}

/// GET /api/nko/:id - Get a single organization.
pub async fn get_nko(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Nko> {
    match state.repo.get_nko(id).await? {
        Some(nko) => success(nko),
        None => Err(AppError::NotFound(format!("NKO {} not found", id))),
    }
}

/// POST /api/nko/add - Create a new organization.
pub async fn create_nko(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateNkoRequest>,
) -> ApiResult<Nko> {
    let errors = validate_create_nko(&request);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let nko = state.repo.create_nko(&request).await?;
    tracing::info!("Created NKO {} ({})", nko.id, nko.name);
    success(nko)
}

/// DELETE /api/nko/:id - Delete an organization and its favorites.
pub async fn delete_nko(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.repo.delete_nko(id).await?;
    tracing::info!("Deleted NKO {}", id);
    success(())
}

/// GET /api/nko/categories - List NKO categories.
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    success(state.repo.list_categories().await?)
}

/// GET /api/nko/favorites - The requester's favorite organizations.
pub async fn list_favorite_nko(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Vec<Nko>> {
    let ids = state
        .repo
        .favorite_ids(FavoriteTarget::Nko, identity.user_id())
        .await?;
    let filter = ListFilter::default().with_favorites(ids);
    success(filter.apply(state.repo.list_nko().await?))
}

/// POST /api/nko/:id/favorite
pub async fn favorite_nko(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<FavoriteStatus> {
    let changed = state
        .repo
        .add_favorite(FavoriteTarget::Nko, identity.user_id(), id)
        .await?;
    success(FavoriteStatus {
        item_id: id,
        favorited: true,
        changed,
    })
}

/// DELETE /api/nko/:id/favorite
pub async fn unfavorite_nko(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<FavoriteStatus> {
    let changed = state
        .repo
        .remove_favorite(FavoriteTarget::Nko, identity.user_id(), id)
        .await?;
    success(FavoriteStatus {
        item_id: id,
        favorited: false,
        changed,
    })
}

fn validate_create_nko(request: &CreateNkoRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require_text(&mut errors, "name", &request.name);
    require_text(&mut errors, "description", &request.description);

    if let Some(lat) = request.latitude {
        if !(-90.0..=90.0).contains(&lat) {
            errors.push(FieldError::new("latitude", "must be between -90 and 90"));
        }
    }
    if let Some(lon) = request.longitude {
        if !(-180.0..=180.0).contains(&lon) {
            errors.push(FieldError::new("longitude", "must be between -180 and 180"));
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_are_all_reported() {
        let request = CreateNkoRequest {
            latitude: Some(91.0),
            longitude: Some(37.6),
            ..Default::default()
        };
        let fields: Vec<String> = validate_create_nko(&request)
            .into_iter()
            .map(|f| f.field)
            .collect();
        assert_eq!(fields, vec!["name", "description", "latitude"]);
    }

    #[test]
    fn test_optional_fields_may_be_absent() {
        let request = CreateNkoRequest {
            name: "Test Fund".to_string(),
            description: "Helps schools".to_string(),
            ..Default::default()
        };
        assert!(validate_create_nko(&request).is_empty());
    }
}
