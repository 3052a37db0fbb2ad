//! News API endpoints.

use axum::extract::{Path, State};

use super::{
    require_text, success, with_favorite_scope, ApiResult, FavoriteStatus, JsonBody, QueryParams,
};
use crate::auth::{Identity, OptionalIdentity};
use crate::db::FavoriteTarget;
use crate::errors::AppError;
use crate::filter::ListFilter;
use crate::models::{CreateNewsRequest, NewsItem, NewsQuery};
use crate::AppState;

/// GET /api/news - List news matching the query filters.
pub async fn list_news(
    State(state): State<AppState>,
    identity: OptionalIdentity,
    QueryParams(params): QueryParams<NewsQuery>,
) -> ApiResult<Vec<NewsItem>> {
    let filter = ListFilter::new(params.city.as_deref(), None, params.regex.as_deref())?;
    let filter =
        with_favorite_scope(&state, filter, params.favorite, &identity, FavoriteTarget::News)
            .await?;

    let items = state.repo.list_news().await?;
    success(filter.apply(items))
}

/// GET /api/news/:id - Get a single news item.
pub async fn get_news(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<NewsItem> {
    match state.repo.get_news(id).await? {
        Some(news) => success(news),
        None => Err(AppError::NotFound(format!("News {} not found", id))),
    }
}

/// POST /api/news - Create a news item. The requester, if known, becomes its author.
pub async fn create_news(
    State(state): State<AppState>,
    identity: OptionalIdentity,
    JsonBody(request): JsonBody<CreateNewsRequest>,
) -> ApiResult<NewsItem> {
    let mut errors = Vec::new();
    require_text(&mut errors, "title", &request.title);
    require_text(&mut errors, "description", &request.description);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let author = identity.0.as_ref().map(Identity::user_id);
    let news = state.repo.create_news(&request, author).await?;
    tracing::info!("Created news {} ({})", news.id, news.title);
    success(news)
}

/// DELETE /api/news/:id - Delete a news item and its favorites.
pub async fn delete_news(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.repo.delete_news(id).await?;
    tracing::info!("Deleted news {}", id);
    success(())
}

/// GET /api/news/favorites - The requester's favorite news.
pub async fn list_favorite_news(
    State(state): State<AppState>,
    identity: Identity,
) -> ApiResult<Vec<NewsItem>> {
    let ids = state
        .repo
        .favorite_ids(FavoriteTarget::News, identity.user_id())
        .await?;
    let filter = ListFilter::default().with_favorites(ids);
    success(filter.apply(state.repo.list_news().await?))
}

/// POST /api/news/:id/favorite
pub async fn favorite_news(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<FavoriteStatus> {
    let changed = state
        .repo
        .add_favorite(FavoriteTarget::News, identity.user_id(), id)
        .await?;
    success(FavoriteStatus {
        item_id: id,
        favorited: true,
        changed,
    })
}

/// DELETE /api/news/:id/favorite
pub async fn unfavorite_news(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> ApiResult<FavoriteStatus> {
    let changed = state
        .repo
        .remove_favorite(FavoriteTarget::News, identity.user_id(), id)
        .await?;
    success(FavoriteStatus {
        item_id: id,
        favorited: false,
        changed,
    })
}
