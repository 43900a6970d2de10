use api_dispatch::{CallerIdentity, UserRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::token::generate_token_value;

/// Stored account. Lives in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub role: UserRole,
    pub active: bool,
    /// Always lowercase
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            role: UserRole::User,
            active: true,
            email: email.to_lowercase(),
            password_hash,
            first_name: String::new(),
            middle_name: String::new(),
            last_name: String::new(),
            email_confirmed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn info(&self) -> UserInfo {
        UserInfo {
            id: self.id.clone(),
            role: self.role,
            active: self.active,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            middle_name: self.middle_name.clone(),
            last_name: self.last_name.clone(),
            email_confirmed: self.email_confirmed,
        }
    }

    pub fn identity(&self) -> CallerIdentity {
        CallerIdentity {
            id: self.id.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Public projection of a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub role: UserRole,
    pub active: bool,
    pub email: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email_confirmed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
pub enum TokenKind {
    #[serde(rename = "email")]
    #[strum(serialize = "email")]
    Email,
    #[serde(rename = "psw-reset")]
    #[strum(serialize = "psw-reset")]
    PasswordReset,
}

/// One-time token mailed to a user. Lives in `verification-tokens`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationToken {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

impl VerificationToken {
    pub fn new(user_id: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.into(),
            kind,
            value: generate_token_value(),
            created_at: Utc::now(),
        }
    }
}

/// Profile fields a user may change. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
}

impl ProfileUpdate {
    pub fn apply(self, user: &mut User) {
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(middle_name) = self.middle_name {
            user.middle_name = middle_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        user.touch();
    }
}

/// Everything needed to open an account.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
}
