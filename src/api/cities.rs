//! City API endpoints.

use axum::extract::State;
use serde::Deserialize;

use super::{success, ApiResult, QueryParams};
use crate::filter::TextPattern;
use crate::models::City;
use crate::AppState;

/// City query parameters.
#[derive(Debug, Deserialize)]
pub struct CityQuery {
    #[serde(default)]
    pub regex: Option<String>,
}

/// GET /api/city - List cities, optionally matching a name pattern.
pub async fn list_cities(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<CityQuery>,
) -> ApiResult<Vec<City>> {
    let pattern = TextPattern::parse("regex", params.regex.as_deref())?;

    let cities = state.repo.list_cities().await?;
    let cities = match pattern {
        Some(pattern) => cities
            .into_iter()
            .filter(|city| pattern.is_match(&city.name))
            .collect(),
        None => cities,
    };
    success(cities)
}
