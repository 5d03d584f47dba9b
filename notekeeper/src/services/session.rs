//! Session service
//!
//! Login and registration. A successful login produces a [`Session`] whose
//! scope is the only way to reach that user's notes.

use super::notes::NotesService;
use crate::database::{hash_password, Repository, User, UserScope};
use crate::error::Result;

/// An authenticated user and their scoped stores
#[derive(Clone)]
pub struct Session {
    user: User,
    scope: UserScope,
}

impl Session {
    /// Authenticate with a plain-text password; `None` on any mismatch
    pub async fn login(repo: &Repository, username: &str, password: &str) -> Result<Option<Self>> {
        let Some(user) = repo
            .users()
            .authenticate(username, &hash_password(password))
            .await
            .inspect_err(|e| tracing::error!("Login lookup failed: {}", e))?
        else {
            tracing::warn!("Failed login attempt for {:?}", username);
            return Ok(None);
        };

        let scope = repo.scope(user.id)?;
        tracing::info!("User logged in: {} ({})", user.username, user.id);

        Ok(Some(Self { user, scope }))
    }

    /// Create an account and log it in
    pub async fn register(
        repo: &Repository,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<Self> {
        let user = repo
            .users()
            .create(username, &hash_password(password), email)
            .await
            .inspect_err(|e| tracing::error!("Registration failed: {}", e))?;

        let scope = repo.scope(user.id)?;
        tracing::info!("User registered: {} ({})", user.username, user.id);

        Ok(Self { user, scope })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn scope(&self) -> &UserScope {
        &self.scope
    }

    pub fn notes_service(&self) -> NotesService {
        NotesService::new(&self.scope)
    }
}
