//! NKO Directory Backend
//!
//! REST backend for browsing charitable organizations and news, with favorites
//! and token-based accounts, persisted in SQLite.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod filter;
mod models;
mod validation;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::TokenService;
use config::Config;
use db::Repository;
use models::LogoBases;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the repository and token service from configuration.
    pub fn new(pool: sqlx::SqlitePool, config: Config) -> Self {
        let logos = LogoBases {
            static_base: config.logo_static_base.clone(),
            storage_proxy_base: config.storage_proxy_base.clone(),
            default_logo: config.default_logo.clone(),
        };

        Self {
            repo: Arc::new(Repository::new(pool, logos)),
            tokens: Arc::new(TokenService::new(
                &config.jwt_secret,
                config.token_ttl_minutes,
            )),
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting NKO Directory Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.admin_psk.is_none() {
        tracing::warn!(
            "No admin key configured (NKO_ADMIN_PSK). Create/delete endpoints are open!"
        );
    }
    if config.uses_dev_secret() {
        tracing::warn!("NKO_JWT_SECRET is not set. Tokens are signed with the development secret!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;

    let bind_addr = config.bind_addr;
    let state = AppState::new(pool, config);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the admin layer
    let psk = state.config.admin_psk.clone();

    // Public and identity-aware routes
    let public_routes = Router::new()
        // Organizations
        .route("/nko", get(api::list_nko))
        .route("/nko/categories", get(api::list_categories))
        .route("/nko/favorites", get(api::list_favorite_nko))
        .route("/nko/{id}", get(api::get_nko))
        .route(
            "/nko/{id}/favorite",
            post(api::favorite_nko).delete(api::unfavorite_nko),
        )
        // News
        .route("/news", get(api::list_news))
        .route("/news/favorites", get(api::list_favorite_news))
        .route("/news/{id}", get(api::get_news))
        .route(
            "/news/{id}/favorite",
            post(api::favorite_news).delete(api::unfavorite_news),
        )
        // Cities
        .route("/city", get(api::list_cities))
        // Accounts
        .route("/auth/register", post(api::register))
        .route("/auth/login", post(api::login))
        .route("/auth/me", get(api::me));

    // Create/delete routes, guarded by the admin key when one is configured
    let admin_routes = Router::new()
        .route("/nko/add", post(api::create_nko))
        .route("/nko/{id}", delete(api::delete_nko))
        .route("/news", post(api::create_news))
        .route("/news/{id}", delete(api::delete_news))
        .route_layer(middleware::from_fn(move |req, next| {
            auth::admin_psk_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", public_routes.merge(admin_routes))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
