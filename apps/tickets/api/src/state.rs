//! Shared application state and its construction.

use api_dispatch::ApiDispatcher;
use axum_helpers::SessionKeys;
use domain_notifications::{
    InMemoryMailRepository, MailRepository, MailTransport, Mailer, MongoMailRepository,
    TemplateEngine,
};
use domain_public_events::{
    AnswerRepository, EventRepository, InMemoryAnswerRepository, InMemoryEventRepository,
    InMemoryQuestionRepository, InMemorySurveyRepository, MongoAnswerRepository,
    MongoEventRepository, MongoQuestionRepository, MongoSurveyRepository, PublicEventService,
    QuestionRepository, SurveyRepository,
};
use domain_suggestions::{
    FioSuggestionService, InMemorySuggestionCache, MongoSuggestionCache, SuggestionCache,
    SuggestionProvider,
};
use domain_users::{
    InMemoryTokenRepository, InMemoryUserRepository, MongoTokenRepository, MongoUserRepository,
    TokenRepository, UserRepository, UserService,
};
use domain_visitors::{InMemoryVisitorRepository, MongoVisitorRepository, VisitorRepository};
use mongodb::Database;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;

/// Cloned into every handler; all fields are cheap `Arc` clones.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<ApiDispatcher>,
    pub users: Arc<UserService>,
    pub sessions: SessionKeys,
}

/// Storage behind every service
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub mails: Arc<dyn MailRepository>,
    pub visitors: Arc<dyn VisitorRepository>,
    pub events: Arc<dyn EventRepository>,
    pub surveys: Arc<dyn SurveyRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub answers: Arc<dyn AnswerRepository>,
    pub suggestion_cache: Arc<dyn SuggestionCache>,
}

impl Repositories {
    /// Mongo-backed repositories, with their indexes created.
    pub async fn mongo(db: &Database) -> eyre::Result<Self> {
        let users = MongoUserRepository::new(db);
        users.create_indexes().await?;
        let tokens = MongoTokenRepository::new(db);
        tokens.create_indexes().await?;
        let mails = MongoMailRepository::new(db);
        mails.create_indexes().await?;
        let visitors = MongoVisitorRepository::new(db);
        visitors.create_indexes().await?;
        let events = MongoEventRepository::new(db);
        events.create_indexes().await?;
        let surveys = MongoSurveyRepository::new(db);
        surveys.create_indexes().await?;
        let questions = MongoQuestionRepository::new(db);
        questions.create_indexes().await?;
        let answers = MongoAnswerRepository::new(db);
        answers.create_indexes().await?;
        info!("MongoDB indexes are in place");

        Ok(Self {
            users: Arc::new(users),
            tokens: Arc::new(tokens),
            mails: Arc::new(mails),
            visitors: Arc::new(visitors),
            events: Arc::new(events),
            surveys: Arc::new(surveys),
            questions: Arc::new(questions),
            answers: Arc::new(answers),
            suggestion_cache: Arc::new(MongoSuggestionCache::new(db)),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            tokens: Arc::new(InMemoryTokenRepository::new()),
            mails: Arc::new(InMemoryMailRepository::new()),
            visitors: Arc::new(InMemoryVisitorRepository::new()),
            events: Arc::new(InMemoryEventRepository::new()),
            surveys: Arc::new(InMemorySurveyRepository::new()),
            questions: Arc::new(InMemoryQuestionRepository::new()),
            answers: Arc::new(InMemoryAnswerRepository::new()),
            suggestion_cache: Arc::new(InMemorySuggestionCache::new()),
        }
    }
}

/// External collaborators that are swapped out in tests
pub struct Integrations {
    pub mail_transport: Arc<dyn MailTransport>,
    pub suggestion_provider: Arc<dyn SuggestionProvider>,
}

impl AppState {
    /// Builds every service and the dispatcher. The returned [`Mailer`] owns the
    /// sending job, which the caller starts and stops.
    pub fn build(
        config: &Config,
        repositories: Repositories,
        integrations: Integrations,
    ) -> eyre::Result<(Self, Mailer)> {
        let mailer = Mailer::new(
            repositories.mails,
            integrations.mail_transport,
            TemplateEngine::new()?,
            config.mail.clone(),
        );

        let users = Arc::new(UserService::new(
            repositories.users,
            repositories.tokens,
            mailer.clone(),
            config.links.clone(),
            config.debug.clone(),
        ));
        let events = Arc::new(PublicEventService::new(
            repositories.events,
            repositories.surveys,
            repositories.questions,
            repositories.answers,
            repositories.visitors,
        ));
        let suggestions = Arc::new(FioSuggestionService::new(
            repositories.suggestion_cache,
            integrations.suggestion_provider,
        ));

        let dispatcher = ApiDispatcher::builder()
            .target(domain_users::registry(users.clone()))
            .target(domain_public_events::registry(events))
            .target(domain_suggestions::registry(suggestions))
            .build();
        info!(targets = ?dispatcher.target_names(), "API dispatcher ready");

        let state = Self {
            dispatcher: Arc::new(dispatcher),
            users,
            sessions: SessionKeys::new(&config.session),
        };
        Ok((state, mailer))
    }
}
