use async_trait::async_trait;

use crate::error::UserResult;
use crate::models::{TokenKind, User, VerificationToken};

/// Account storage. Emails are unique and stored lowercase.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DuplicateEmail` when the address is taken.
    async fn create(&self, user: User) -> UserResult<User>;

    async fn get_by_id(&self, id: &str) -> UserResult<Option<User>>;

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;

    async fn update(&self, user: &User) -> UserResult<()>;
}

/// Storage for one-time email and password reset tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn create(&self, token: VerificationToken) -> UserResult<VerificationToken>;

    async fn find(&self, value: &str, kind: TokenKind) -> UserResult<Option<VerificationToken>>;

    async fn delete(&self, id: &str) -> UserResult<()>;

    /// Removes every token of `kind` issued to the user; returns how many.
    async fn delete_for_user(&self, user_id: &str, kind: TokenKind) -> UserResult<u64>;
}
