//! User directory
//!
//! Authentication lookups and account maintenance. Usernames are unique
//! among active accounts; a deactivated account frees its username.

use super::models::User;
use crate::config::MAX_USERNAME_LENGTH;
use crate::error::{AppError, Result};
use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

/// Hex-encoded SHA-256 digest of a plain-text password.
///
/// This is an unsalted digest for exact-match comparison in
/// [`UserDirectory::authenticate`], not a password KDF.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn normalize_username(username: &str) -> Result<String> {
    let username = username.trim();

    if username.is_empty() {
        return Err(AppError::Validation("Username cannot be empty".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Username must be {} characters or less",
            MAX_USERNAME_LENGTH
        )));
    }

    Ok(username.to_string())
}

#[derive(Clone)]
pub struct UserDirectory {
    pool: SqlitePool,
}

impl UserDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up an active account by exact username and password hash.
    ///
    /// An unknown user and a wrong password both yield `None`.
    pub async fn authenticate(&self, username: &str, password_hash: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE username = ? AND password_hash = ? AND is_active = 1
            "#,
        )
        .bind(username.trim())
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Whether an active account uses `username`, ignoring `exclude_user_id`
    pub async fn username_exists(
        &self,
        username: &str,
        exclude_user_id: Option<i64>,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE username = ? AND is_active = 1
              AND (? IS NULL OR id <> ?)
            "#,
        )
        .bind(username.trim())
        .bind(exclude_user_id)
        .bind(exclude_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        email: Option<&str>,
    ) -> Result<User> {
        let username = normalize_username(username)?;

        if self.username_exists(&username, None).await? {
            return Err(AppError::Duplicate(format!(
                "Username already in use: {}",
                username
            )));
        }

        let now = Utc::now();

        // The partial unique index still guards against a concurrent insert.
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, email, is_active, created_at, updated_at)
            VALUES (?, ?, ?, 1, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&username)
        .bind(password_hash)
        .bind(email)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Duplicate(_) => {
                AppError::Duplicate(format!("Username already in use: {}", username))
            }
            other => other,
        })?;

        tracing::info!("Created user: {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn find_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        email: Option<&str>,
        full_name: Option<&str>,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET email = ?, full_name = ?, updated_at = ?
            WHERE id = ? AND is_active = 1
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(full_name)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("user", user_id))?;

        tracing::debug!("Updated profile for user: {}", user_id);
        Ok(user)
    }

    pub async fn change_password(&self, user_id: i64, password_hash: &str) -> Result<()> {
        let rows = sqlx::query(
            "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ? AND is_active = 1",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("user", user_id));
        }

        tracing::debug!("Changed password for user: {}", user_id);
        Ok(())
    }

    pub async fn deactivate(&self, user_id: i64) -> Result<()> {
        let rows = sqlx::query(
            "UPDATE users SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1",
        )
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("user", user_id));
        }

        tracing::info!("Deactivated user: {}", user_id);
        Ok(())
    }
}
