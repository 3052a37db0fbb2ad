//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for organizations, news, accounts and favorites.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS nko_categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            login TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user'
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS nko (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            logo_kind TEXT,
            logo_value TEXT,
            address TEXT,
            city_id INTEGER REFERENCES cities(id),
            latitude REAL,
            longitude REAL,
            meta TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS nko_categories_link (
            nko_id INTEGER NOT NULL REFERENCES nko(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES nko_categories(id) ON DELETE CASCADE,
            PRIMARY KEY (nko_id, category_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS news (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            image TEXT,
            city_id INTEGER REFERENCES cities(id),
            created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
            approved_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
            meta TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // One row per (user, item)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS favorite_news (
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            news_id INTEGER NOT NULL REFERENCES news(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            PRIMARY KEY (user_id, news_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS favorite_nko (
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            nko_id INTEGER NOT NULL REFERENCES nko(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            PRIMARY KEY (user_id, nko_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_nko_city ON nko(city_id);
        CREATE INDEX IF NOT EXISTS idx_news_city ON news(city_id);
        CREATE INDEX IF NOT EXISTS idx_link_category ON nko_categories_link(category_id);
        CREATE INDEX IF NOT EXISTS idx_favorite_news_item ON favorite_news(news_id);
        CREATE INDEX IF NOT EXISTS idx_favorite_nko_item ON favorite_nko(nko_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
