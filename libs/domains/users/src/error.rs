use api_dispatch::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    Inactive,

    #[error("Wrong old password")]
    WrongPassword,

    #[error("Token not found")]
    TokenNotFound,

    #[error("Email already confirmed")]
    EmailAlreadyConfirmed,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<mongodb::error::Error> for UserError {
    fn from(err: mongodb::error::Error) -> Self {
        UserError::Database(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for UserError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        UserError::Internal(err.to_string())
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match &err {
            UserError::NotFound(_) | UserError::TokenNotFound => ApiError::not_found(err.to_string()),
            UserError::DuplicateEmail(_) | UserError::WrongPassword => {
                ApiError::forbidden(err.to_string())
            }
            UserError::InvalidCredentials | UserError::Inactive => {
                ApiError::unauthorized(err.to_string())
            }
            UserError::EmailAlreadyConfirmed => ApiError::bad_request(err.to_string()),
            UserError::PasswordHash(msg) | UserError::Database(msg) | UserError::Internal(msg) => {
                tracing::error!(error = %msg, "Users service failure");
                ApiError::internal(msg.clone())
            }
        }
    }
}
