//! News model.

use serde::{Deserialize, Serialize};

/// A news item published in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub city_id: Option<i64>,
    /// Name of the owning city
    pub city: Option<String>,
    /// Full name of the author
    pub created_by: Option<String>,
    /// Full name of the approving moderator
    pub approved_by: Option<String>,
    pub meta: Option<String>,
    pub created_at: String,
}

/// Request body for `POST /api/news`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateNewsRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub city_id: Option<i64>,
    #[serde(default)]
    pub meta: Option<String>,
}

/// Query string for `GET /api/news`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsQuery {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub favorite: Option<bool>,
}
