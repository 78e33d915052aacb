//! Resolving token identities to stored users.

use sweetjobs_models::User;
use sweetjobs_store::{Store, UserStore};

use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct UserService<S> {
    store: S,
}

impl<S: Store> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The user a token was issued for.
    pub async fn by_email(&self, email: &str) -> ApiResult<User> {
        let mut tx = self.store.begin().await?;
        tx.find_user_by_email(email)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("user '{}'", email)))
    }

    pub async fn by_id(&self, id: i32) -> ApiResult<User> {
        let mut tx = self.store.begin().await?;
        tx.find_user(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("user {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweetjobs_store::MemoryStore;

    #[tokio::test]
    async fn test_by_email() {
        let store = MemoryStore::new();
        let anna = store.add_user("anna@example.com", Some("Anna"), None, "user").await;
        let users = UserService::new(store);

        assert_eq!(users.by_email("anna@example.com").await.unwrap(), anna);
        assert_eq!(users.by_id(anna.id).await.unwrap().email, "anna@example.com");

        let err = users.by_email("nobody@example.com").await.unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }
}
