use api_dispatch::ApiError;
use domain_visitors::VisitorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Survey not found: {0}")]
    SurveyNotFound(String),

    #[error("Survey question not found: {0}")]
    QuestionNotFound(String),

    #[error("Unknown event id '{0}'")]
    UnknownEvent(String),

    #[error("Unknown survey id '{0}'")]
    UnknownSurvey(String),

    #[error("{0}")]
    InvalidSchedule(String),

    #[error("Answer type {0} requires at least two answer variants")]
    NotEnoughVariants(String),

    #[error("Invalid questionIDs array (existing question {0} is missing)")]
    IncompleteOrder(String),

    #[error(transparent)]
    Visitor(#[from] VisitorError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type EventResult<T> = Result<T, EventError>;

impl From<mongodb::error::Error> for EventError {
    fn from(err: mongodb::error::Error) -> Self {
        EventError::Database(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for EventError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        EventError::Internal(err.to_string())
    }
}

impl From<EventError> for ApiError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::EventNotFound(_)
            | EventError::SurveyNotFound(_)
            | EventError::QuestionNotFound(_) => ApiError::not_found(err.to_string()),
            EventError::UnknownEvent(_)
            | EventError::UnknownSurvey(_)
            | EventError::InvalidSchedule(_)
            | EventError::NotEnoughVariants(_)
            | EventError::IncompleteOrder(_) => ApiError::bad_request(err.to_string()),
            EventError::Visitor(inner) => inner.into(),
            EventError::Database(msg) | EventError::Internal(msg) => {
                tracing::error!(error = %msg, "Public events service failure");
                ApiError::internal(msg)
            }
        }
    }
}
