use async_trait::async_trait;

use crate::error::EventResult;
use crate::models::{Event, Survey, SurveyAnswer, SurveyQuestion};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: Event) -> EventResult<Event>;

    async fn get_by_id(&self, id: &str) -> EventResult<Option<Event>>;

    async fn update(&self, event: &Event) -> EventResult<()>;

    /// Events of one owner, earliest start first.
    async fn find_by_owner(&self, user_id: &str) -> EventResult<Vec<Event>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SurveyRepository: Send + Sync {
    async fn create(&self, survey: Survey) -> EventResult<Survey>;

    async fn get_by_id(&self, id: &str) -> EventResult<Option<Survey>>;

    async fn update(&self, survey: &Survey) -> EventResult<()>;

    /// Surveys of one owner, most recently updated first.
    async fn find_by_owner(&self, user_id: &str) -> EventResult<Vec<Survey>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn create(&self, question: SurveyQuestion) -> EventResult<SurveyQuestion>;

    async fn get_by_id(&self, id: &str) -> EventResult<Option<SurveyQuestion>>;

    async fn update(&self, question: &SurveyQuestion) -> EventResult<()>;

    /// Returns false when nothing was removed.
    async fn delete(&self, id: &str) -> EventResult<bool>;

    /// Questions of one survey ordered by `display_order`.
    async fn find_by_survey(&self, survey_id: &str) -> EventResult<Vec<SurveyQuestion>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnswerRepository: Send + Sync {
    /// Inserts, or overwrites the value of the answer with the same
    /// survey, question and visitor.
    async fn upsert(&self, answer: SurveyAnswer) -> EventResult<()>;

    async fn find_for_visitor(
        &self,
        visitor_id: &str,
        survey_id: &str,
    ) -> EventResult<Vec<SurveyAnswer>>;
}
