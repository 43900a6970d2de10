//! Error types for the mail outbox.

use thiserror::Error;

pub type NotificationResult<T> = Result<T, NotificationError>;

#[derive(Debug, Error)]
pub enum NotificationError {
    /// No template registered under this name.
    #[error("Unknown mail template '{0}'")]
    UnknownTemplate(String),

    #[error("Template rendering error: {0}")]
    Template(String),

    /// The message cannot be built (no subject, no body, bad address).
    #[error("Invalid mail: {0}")]
    InvalidMail(String),

    #[error("Mail transport error: {0}")]
    Transport(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<handlebars::RenderError> for NotificationError {
    fn from(err: handlebars::RenderError) -> Self {
        NotificationError::Template(err.to_string())
    }
}

impl From<handlebars::TemplateError> for NotificationError {
    fn from(err: handlebars::TemplateError) -> Self {
        NotificationError::Template(err.to_string())
    }
}

impl From<mongodb::error::Error> for NotificationError {
    fn from(err: mongodb::error::Error) -> Self {
        NotificationError::Database(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for NotificationError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        NotificationError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for NotificationError {
    fn from(err: serde_json::Error) -> Self {
        NotificationError::Internal(format!("JSON serialization error: {}", err))
    }
}

impl From<lettre::address::AddressError> for NotificationError {
    fn from(err: lettre::address::AddressError) -> Self {
        NotificationError::InvalidMail(format!("bad address: {}", err))
    }
}
