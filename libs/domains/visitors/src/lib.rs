//! Visitors Domain
//!
//! Deduplicates registration form submissions. A visitor is identified by an MD5
//! fingerprint of their identity fields, unique within a scope (one event, or the
//! fast-track pool). Submitting the same form again bumps a counter instead of
//! creating a second visitor.
//!
//! ```text
//! VisitorRegistration ──► fingerprint(fields) ──► VisitorRegistry::register_or_update
//!                                                   │ 1. record_repeat    (atomic $inc)
//!                                                   │ 2. insert_or_repeat (atomic upsert)
//!                                                   ▼
//!                                     VisitorRepository (Mongo / in-memory)
//! ```

pub mod error;
pub mod fingerprint;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;
pub mod user_agent;

pub use error::{VisitorError, VisitorResult};
pub use memory::InMemoryVisitorRepository;
pub use models::{
    Gender, RegistrationOutcome, SourceType, VisitorFields, VisitorRecord, VisitorRegistration,
    VisitorScope, VolatileFields,
};
pub use crate::mongodb::MongoVisitorRepository;
pub use repository::VisitorRepository;
pub use service::VisitorRegistry;
pub use user_agent::UserAgentInfo;
