//! Public Events Domain
//!
//! Events owned by organizer accounts, the registration surveys attached to
//! them and visitor sign-up. Visitor deduplication is delegated to
//! `domain_visitors`; this crate adds the event context and the survey answers.
//!
//! ```text
//! events/registerEventVisitor
//!   ├─ EventRepository::get_by_id        (unknown → BadRequest)
//!   ├─ VisitorRegistry::register_or_update(scope = event:<id>)
//!   └─ AnswerRepository::upsert          (only questions of the event's survey)
//! ```

pub mod actions;
pub mod error;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

pub use actions::{EventsAction, TARGET, registry};
pub use error::{EventError, EventResult};
pub use memory::{
    InMemoryAnswerRepository, InMemoryEventRepository, InMemoryQuestionRepository,
    InMemorySurveyRepository,
};
pub use models::{
    AnswerType, AnswerValue, Event, EventFullInfo, EventInfo, Place, Survey, SurveyAnswer,
    SurveyInfo, SurveyQuestion, SurveyQuestionInfo, VisitorInfo,
};
pub use crate::mongodb::{
    MongoAnswerRepository, MongoEventRepository, MongoQuestionRepository, MongoSurveyRepository,
};
pub use repository::{AnswerRepository, EventRepository, QuestionRepository, SurveyRepository};
pub use service::PublicEventService;
