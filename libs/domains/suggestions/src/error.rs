use api_dispatch::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("Suggestion service is not configured")]
    NotConfigured,

    #[error("Suggestion service request failed: {0}")]
    Provider(String),

    #[error("Suggestion cache error: {0}")]
    Cache(String),
}

pub type SuggestionResult<T> = Result<T, SuggestionError>;

impl From<reqwest::Error> for SuggestionError {
    fn from(err: reqwest::Error) -> Self {
        SuggestionError::Provider(err.to_string())
    }
}

impl From<mongodb::error::Error> for SuggestionError {
    fn from(err: mongodb::error::Error) -> Self {
        SuggestionError::Cache(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for SuggestionError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        SuggestionError::Cache(err.to_string())
    }
}

impl From<SuggestionError> for ApiError {
    fn from(err: SuggestionError) -> Self {
        ApiError::internal(err.to_string())
    }
}
