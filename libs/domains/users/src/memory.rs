//! In-memory repositories for tests and local runs

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{TokenKind, User, VerificationToken};
use crate::repository::{TokenRepository, UserRepository};

#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(UserError::DuplicateEmail(user.email));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: &str) -> UserResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update(&self, user: &User) -> UserResult<()> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(UserError::NotFound(user.id.clone())),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryTokenRepository {
    tokens: Arc<RwLock<HashMap<String, VerificationToken>>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<VerificationToken> {
        self.tokens.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn create(&self, token: VerificationToken) -> UserResult<VerificationToken> {
        self.tokens
            .write()
            .await
            .insert(token.id.clone(), token.clone());
        Ok(token)
    }

    async fn find(&self, value: &str, kind: TokenKind) -> UserResult<Option<VerificationToken>> {
        Ok(self
            .tokens
            .read()
            .await
            .values()
            .find(|t| t.value == value && t.kind == kind)
            .cloned())
    }

    async fn delete(&self, id: &str) -> UserResult<()> {
        self.tokens.write().await.remove(id);
        Ok(())
    }

    async fn delete_for_user(&self, user_id: &str, kind: TokenKind) -> UserResult<u64> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| !(t.user_id == user_id && t.kind == kind));
        Ok((before - tokens.len()) as u64)
    }
}
