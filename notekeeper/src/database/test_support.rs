//! Fixtures shared by the store tests

use super::{create_memory_pool, Repository, UserScope};
use crate::database::users::hash_password;

/// Fresh in-memory repository with one registered user
pub(crate) async fn create_test_scope(username: &str) -> (Repository, UserScope) {
    let repo = Repository::new(create_memory_pool().await.unwrap());
    let scope = add_user(&repo, username).await;
    (repo, scope)
}

/// Register another user on an existing repository
pub(crate) async fn add_user(repo: &Repository, username: &str) -> UserScope {
    let user = repo
        .users()
        .create(username, &hash_password("password"), None)
        .await
        .unwrap();
    repo.scope(user.id).unwrap()
}
