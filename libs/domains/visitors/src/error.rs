use api_dispatch::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VisitorError {
    #[error("Visitor not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type VisitorResult<T> = Result<T, VisitorError>;

impl From<mongodb::error::Error> for VisitorError {
    fn from(err: mongodb::error::Error) -> Self {
        VisitorError::Database(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for VisitorError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        VisitorError::Internal(err.to_string())
    }
}

impl From<VisitorError> for ApiError {
    fn from(err: VisitorError) -> Self {
        match err {
            VisitorError::NotFound(id) => ApiError::not_found(format!("visitor {} not found", id)),
            VisitorError::Database(msg) | VisitorError::Internal(msg) => ApiError::internal(msg),
        }
    }
}
