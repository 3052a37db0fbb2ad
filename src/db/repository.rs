//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use crate::errors::AppError;
use crate::models::{
    Category, City, CreateNewsRequest, CreateNkoRequest, LogoBases, LogoRef, NewsItem, Nko, User,
    UserRole,
};

/// Kind of item a user can favorite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteTarget {
    News,
    Nko,
}

impl FavoriteTarget {
    fn table(&self) -> &'static str {
        match self {
            FavoriteTarget::News => "favorite_news",
            FavoriteTarget::Nko => "favorite_nko",
        }
    }

    fn item_column(&self) -> &'static str {
        match self {
            FavoriteTarget::News => "news_id",
            FavoriteTarget::Nko => "nko_id",
        }
    }

    fn item_table(&self) -> &'static str {
        match self {
            FavoriteTarget::News => "news",
            FavoriteTarget::Nko => "nko",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            FavoriteTarget::News => "News",
            FavoriteTarget::Nko => "NKO",
        }
    }
}

const NKO_SELECT: &str = r#"SELECT n.id, n.name, n.description, n.logo_kind, n.logo_value,
                  n.address, c.name AS city_name, n.latitude, n.longitude, n.meta, n.created_at
           FROM nko n LEFT JOIN cities c ON n.city_id = c.id"#;

const NEWS_SELECT: &str = r#"SELECT n.id, n.title, n.description, n.image, n.city_id,
                  c.name AS city_name, cu.full_name AS created_by_name,
                  au.full_name AS approved_by_name, n.meta, n.created_at
           FROM news n
           LEFT JOIN cities c ON n.city_id = c.id
           LEFT JOIN users cu ON n.created_by = cu.id
           LEFT JOIN users au ON n.approved_by = au.id"#;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
    logos: LogoBases,
}

impl Repository {
    pub fn new(pool: SqlitePool, logos: LogoBases) -> Self {
        Self { pool, logos }
    }

    // ==================== CITY / CATEGORY OPERATIONS ====================

    /// List all cities.
    pub async fn list_cities(&self) -> Result<Vec<City>, AppError> {
        let rows = sqlx::query("SELECT id, name FROM cities ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| City {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    /// Get a city by ID.
    pub async fn get_city(&self, id: i64) -> Result<Option<City>, AppError> {
        let row = sqlx::query("SELECT id, name FROM cities WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| City {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }

    /// List all NKO categories by name.
    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let rows = sqlx::query("SELECT id, name, created_at FROM nko_categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| Category {
                id: row.get("id"),
                name: row.get("name"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    // ==================== NKO OPERATIONS ====================

    /// List all organizations, id ascending.
    pub async fn list_nko(&self) -> Result<Vec<Nko>, AppError> {
        let rows = sqlx::query(&format!("{} ORDER BY n.id", NKO_SELECT))
            .fetch_all(&self.pool)
            .await?;

        let mut categories = self.categories_by_nko(None).await?;

        Ok(rows
            .iter()
            .map(|row| {
                let id: i64 = row.get("id");
                let tags = categories.remove(&id).unwrap_or_default();
                nko_from_row(row, tags, &self.logos)
            })
            .collect())
    }

    /// Get an organization by ID.
    pub async fn get_nko(&self, id: i64) -> Result<Option<Nko>, AppError> {
        let row = sqlx::query(&format!("{} WHERE n.id = ?", NKO_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tags = self
            .categories_by_nko(Some(id))
            .await?
            .remove(&id)
            .unwrap_or_default();

        Ok(Some(nko_from_row(&row, tags, &self.logos)))
    }

    /// Category names per organization, optionally for a single organization.
    async fn categories_by_nko(
        &self,
        nko_id: Option<i64>,
    ) -> Result<HashMap<i64, Vec<String>>, AppError> {
        let rows = sqlx::query(
            r#"SELECT l.nko_id, c.name
               FROM nko_categories_link l
               JOIN nko_categories c ON l.category_id = c.id
               WHERE ?1 IS NULL OR l.nko_id = ?1
               ORDER BY c.name"#,
        )
        .bind(nko_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_nko: HashMap<i64, Vec<String>> = HashMap::new();
        for row in rows {
            by_nko
                .entry(row.get("nko_id"))
                .or_default()
                .push(row.get("name"));
        }
        Ok(by_nko)
    }

    /// Create a new organization. Unknown city and category names are created.
    pub async fn create_nko(&self, request: &CreateNkoRequest) -> Result<Nko, AppError> {
        let now = Utc::now().to_rfc3339();
        let logo = request.logo.as_deref().and_then(LogoRef::classify);
        let (logo_kind, logo_value) = match &logo {
            Some(logo) => {
                let (kind, value) = logo.to_parts();
                (Some(kind), Some(value.to_string()))
            }
            None => (None, None),
        };
        let meta_json = request
            .meta
            .as_ref()
            .map(|m| serde_json::Value::Object(m.clone()).to_string());

        let mut tx = self.pool.begin().await?;

        let city_id = match request.city.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(city_id_for(&mut tx, name).await?),
            _ => None,
        };

        let result = sqlx::query(
            r#"INSERT INTO nko (name, description, logo_kind, logo_value, address, city_id,
                                latitude, longitude, meta, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(request.name.trim())
        .bind(request.description.trim())
        .bind(logo_kind)
        .bind(&logo_value)
        .bind(&request.address)
        .bind(city_id)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(&meta_json)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();

        let mut seen = HashSet::new();
        for name in request.categories.iter().map(|c| c.trim()) {
            if name.is_empty() || !seen.insert(name) {
                continue;
            }
            let category_id = category_id_for(&mut tx, name, &now).await?;
            sqlx::query(
                "INSERT OR IGNORE INTO nko_categories_link (nko_id, category_id) VALUES (?, ?)",
            )
            .bind(id)
            .bind(category_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_nko(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("NKO {} vanished after insert", id)))
    }

    /// Delete an organization together with its favorites and category links.
    pub async fn delete_nko(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM favorite_nko WHERE nko_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM nko_categories_link WHERE nko_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM nko WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("NKO {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    // ==================== NEWS OPERATIONS ====================

    /// List all news, id ascending.
    pub async fn list_news(&self) -> Result<Vec<NewsItem>, AppError> {
        let rows = sqlx::query(&format!("{} ORDER BY n.id", NEWS_SELECT))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(news_from_row).collect())
    }

    /// Get a news item by ID.
    pub async fn get_news(&self, id: i64) -> Result<Option<NewsItem>, AppError> {
        let row = sqlx::query(&format!("{} WHERE n.id = ?", NEWS_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(news_from_row))
    }

    /// Create a news item, recording `author` as its creator when known.
    pub async fn create_news(
        &self,
        request: &CreateNewsRequest,
        author: Option<i64>,
    ) -> Result<NewsItem, AppError> {
        if let Some(city_id) = request.city_id {
            if self.get_city(city_id).await?.is_none() {
                return Err(AppError::invalid_field(
                    "city_id",
                    format!("City {} does not exist", city_id),
                ));
            }
        }

        let now = Utc::now().to_rfc3339();
        let image = request
            .image
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let result = sqlx::query(
            r#"INSERT INTO news (title, description, image, city_id, created_by, meta, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(request.title.trim())
        .bind(request.description.trim())
        .bind(image)
        .bind(request.city_id)
        .bind(author)
        .bind(&request.meta)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_news(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("News {} vanished after insert", id)))
    }

    /// Delete a news item together with its favorites.
    pub async fn delete_news(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM favorite_news WHERE news_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM news WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("News {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    // ==================== FAVORITE OPERATIONS ====================

    /// Ids of the items a user has favorited.
    pub async fn favorite_ids(
        &self,
        target: FavoriteTarget,
        user_id: i64,
    ) -> Result<HashSet<i64>, AppError> {
        let sql = format!(
            "SELECT {col} FROM {table} WHERE user_id = ?",
            col = target.item_column(),
            table = target.table()
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get::<i64, _>(0)).collect())
    }

    /// Favorite an item. Returns `false` when it already was a favorite.
    pub async fn add_favorite(
        &self,
        target: FavoriteTarget,
        user_id: i64,
        item_id: i64,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query(&format!(
            "SELECT 1 FROM {} WHERE id = ?",
            target.item_table()
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?
        .is_some();

        if !exists {
            return Err(AppError::NotFound(format!(
                "{} {} not found",
                target.label(),
                item_id
            )));
        }

        // The composite primary key turns a duplicate into a no-op
        let sql = format!(
            "INSERT OR IGNORE INTO {table} (user_id, {col}, created_at) VALUES (?, ?, ?)",
            table = target.table(),
            col = target.item_column()
        );
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(item_id)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a favorite. Returns `false` when there was nothing to remove.
    pub async fn remove_favorite(
        &self,
        target: FavoriteTarget,
        user_id: i64,
        item_id: i64,
    ) -> Result<bool, AppError> {
        let sql = format!(
            "DELETE FROM {table} WHERE user_id = ? AND {col} = ?",
            table = target.table(),
            col = target.item_column()
        );
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ==================== USER OPERATIONS ====================

    /// Create a user. The login must not be registered yet.
    pub async fn create_user(
        &self,
        full_name: &str,
        login: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        let result = sqlx::query(
            "INSERT INTO users (full_name, login, password_hash, role) VALUES (?, ?, ?, ?)",
        )
        .bind(full_name)
        .bind(login)
        .bind(password_hash)
        .bind(role.as_str())
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(AppError::Conflict(format!(
                    "Login {} is already registered",
                    login
                )));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(User {
            id: result.last_insert_rowid(),
            full_name: full_name.to_string(),
            login: login.to_string(),
            role,
        })
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query("SELECT id, full_name, login, role FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Look up a user and their password hash by login.
    pub async fn find_credentials(&self, login: &str) -> Result<Option<(User, String)>, AppError> {
        let row = sqlx::query(
            "SELECT id, full_name, login, role, password_hash FROM users WHERE login = ?",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| (user_from_row(&row), row.get("password_hash"))))
    }
}

/// Id of the city called `name`, inserting it if needed.
async fn city_id_for(tx: &mut Transaction<'_, Sqlite>, name: &str) -> Result<i64, AppError> {
    sqlx::query("INSERT OR IGNORE INTO cities (name) VALUES (?)")
        .bind(name)
        .execute(&mut **tx)
        .await?;

    let row = sqlx::query("SELECT id FROM cities WHERE name = ?")
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
    Ok(row.get("id"))
}

/// Id of the category called `name`, inserting it if needed.
async fn category_id_for(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    now: &str,
) -> Result<i64, AppError> {
    sqlx::query("INSERT OR IGNORE INTO nko_categories (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(now)
        .execute(&mut **tx)
        .await?;

    let row = sqlx::query("SELECT id FROM nko_categories WHERE name = ?")
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
    Ok(row.get("id"))
}

// Helper functions for row conversion

fn nko_from_row(row: &sqlx::sqlite::SqliteRow, categories: Vec<String>, logos: &LogoBases) -> Nko {
    let logo_kind: Option<String> = row.get("logo_kind");
    let logo_value: Option<String> = row.get("logo_value");
    let meta_str: Option<String> = row.get("meta");

    let logo = match (logo_kind, logo_value) {
        (Some(kind), Some(value)) => Some(LogoRef::from_parts(&kind, value)),
        _ => None,
    };

    Nko {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        logo_url: logos.resolve(logo.as_ref()),
        logo,
        address: row.get("address"),
        city: row.get("city_name"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        meta: meta_str.and_then(|s| serde_json::from_str(&s).ok()),
        categories,
        created_at: row.get("created_at"),
    }
}

fn news_from_row(row: &sqlx::sqlite::SqliteRow) -> NewsItem {
    NewsItem {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        image: row.get("image"),
        city_id: row.get("city_id"),
        city: row.get("city_name"),
        created_by: row.get("created_by_name"),
        approved_by: row.get("approved_by_name"),
        meta: row.get("meta"),
        created_at: row.get("created_at"),
    }
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    let role: String = row.get("role");
    User {
        id: row.get("id"),
        full_name: row.get("full_name"),
        login: row.get("login"),
        role: UserRole::parse(&role).unwrap_or_default(),
    }
}
