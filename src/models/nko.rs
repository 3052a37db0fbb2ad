//! Organization (NKO) model.

use serde::{Deserialize, Serialize};

use super::LogoRef;

/// A charitable organization listed in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nko {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub logo: Option<LogoRef>,
    /// Resolved URL of `logo`, or the default image
    pub logo_url: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub meta: Option<serde_json::Map<String, serde_json::Value>>,
    pub categories: Vec<String>,
    pub created_at: String,
}

/// Request body for `POST /api/nko/add`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateNkoRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub meta: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Query string for `GET /api/nko`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NkoQuery {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub favorite: Option<bool>,
}
