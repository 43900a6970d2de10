//! Users Domain
//!
//! Accounts of the tickets service and the `users` dispatch target.
//!
//! # Features
//!
//! - Registration with Argon2 password hashing
//! - Email confirmation and password reset through one-time tokens
//! - Profile reads and updates (own profile, any profile for admins)
//! - Credential check for the login endpoint
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Actions   │  ← `users` target, params validation, guards
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Business rules, tokens, queued mail
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← users / verification-tokens (Mongo, in-memory)
//! └─────────────┘
//! ```

pub mod actions;
pub mod error;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;
pub mod token;

pub use crate::mongodb::{MongoTokenRepository, MongoUserRepository};
pub use actions::{UsersAction, registry};
pub use error::{UserError, UserResult};
pub use memory::{InMemoryTokenRepository, InMemoryUserRepository};
pub use models::{NewAccount, ProfileUpdate, TokenKind, User, UserInfo, VerificationToken};
pub use repository::{TokenRepository, UserRepository};
pub use service::UserService;
