//! SQLite user store.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use vortex_domain::entities::{Role, User};
use vortex_domain::error::{Error, Result};
use vortex_domain::ports::users::UserStore;

const DDL: &str = "CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'guest',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    last_login TEXT
)";

/// User table in the security database.
pub struct SqliteUserStore {
    pool: sqlx::SqlitePool,
}

impl SqliteUserStore {
    /// Open (and migrate) the security database at `path`.
    ///
    /// # Errors
    /// Returns an error when the file cannot be opened or the DDL fails.
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = super::connect(path).await?;
        sqlx::query(DDL)
            .execute(&pool)
            .await
            .map_err(|e| Error::database_with_source("apply users DDL", e))?;
        Ok(Self { pool })
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let role: String = row
            .try_get("role")
            .map_err(|e| Error::database_with_source("read user role", e))?;
        let created_at: String = row
            .try_get("created_at")
            .map_err(|e| Error::database_with_source("read created_at", e))?;
        let last_login: Option<String> = row.try_get("last_login").ok();

        Ok(User {
            id: row
                .try_get("id")
                .map_err(|e| Error::database_with_source("read user id", e))?,
            username: row
                .try_get("username")
                .map_err(|e| Error::database_with_source("read username", e))?,
            password_hash: row
                .try_get("password_hash")
                .map_err(|e| Error::database_with_source("read password hash", e))?,
            role: role.parse()?,
            is_active: row.try_get::<i64, _>("is_active").unwrap_or(1) != 0,
            created_at: parse_timestamp(&created_at)?,
            last_login: last_login.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::database(format!("malformed timestamp '{value}'")))
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create(&self, username: &str, password_hash: &str, role: Role) -> Result<User> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, role, is_active, created_at)
             VALUES (?, ?, ?, 1, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database_with_source("insert user", e))?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_owned(),
            password_hash: password_hash.to_owned(),
            role,
            is_active: true,
            created_at: now,
            last_login: None,
        })
    }

    async fn find(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::database_with_source("fetch user", e))?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn touch_login(&self, username: &str) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = ? WHERE username = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::database_with_source("update last login", e))?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY username")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::database_with_source("list users", e))?;
        rows.iter().map(Self::row_to_user).collect()
    }

    async fn delete(&self, username: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::database_with_source("delete user", e))?;
        Ok(result.rows_affected() > 0)
    }
}
