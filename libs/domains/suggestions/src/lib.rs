//! Suggestions Domain
//!
//! Full-name (FIO) completion for registration forms, backed by the DaData
//! suggestions API. Answers are cached in Mongo per name part and gender
//! (`dadata-cache-<part>-<gender>`), with a hit counter per query.

pub mod actions;
pub mod cache;
pub mod error;
pub mod models;
pub mod provider;
pub mod service;

pub use actions::{CoreAction, TARGET, registry};
pub use cache::{InMemorySuggestionCache, MongoSuggestionCache, SuggestionCache};
pub use error::{SuggestionError, SuggestionResult};
pub use models::{FioGender, FioPart, FioRequest, FioSuggestion, FioSuggestions, SuggestionSource};
pub use provider::{DaDataClient, SuggestionProvider};
pub use service::FioSuggestionService;
