//! Repository entry point
//!
//! `Repository` owns the pool and hands out two kinds of access:
//! the unscoped [`UserDirectory`] used at login, and a [`UserScope`]
//! bound to one authenticated user. Note, tag and version operations
//! exist only on stores obtained from a scope, so every one of them is
//! filtered by the scope's user id.

use super::{NoteStore, TagStore, UserDirectory, VersionStore};
use crate::error::{AppError, Result};
use sqlx::SqlitePool;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Account lookups; the only surface not bound to a user
    pub fn users(&self) -> UserDirectory {
        UserDirectory::new(self.pool.clone())
    }

    /// Bind the stores to `user_id`
    pub fn scope(&self, user_id: i64) -> Result<UserScope> {
        if user_id <= 0 {
            return Err(AppError::Validation(format!(
                "Owner id must be positive, got {}",
                user_id
            )));
        }

        Ok(UserScope {
            pool: self.pool.clone(),
            user_id,
        })
    }
}

/// Store access for a single user
#[derive(Clone)]
pub struct UserScope {
    pool: SqlitePool,
    user_id: i64,
}

impl UserScope {
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn notes(&self) -> NoteStore {
        NoteStore::new(self.pool.clone(), self.user_id)
    }

    pub fn tags(&self) -> TagStore {
        TagStore::new(self.pool.clone(), self.user_id)
    }

    pub fn versions(&self) -> VersionStore {
        VersionStore::new(self.pool.clone(), self.user_id)
    }
}
