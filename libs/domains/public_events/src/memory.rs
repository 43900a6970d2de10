//! In-memory repositories for tests and local runs

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{EventError, EventResult};
use crate::models::{Event, Survey, SurveyAnswer, SurveyQuestion};
use crate::repository::{AnswerRepository, EventRepository, QuestionRepository, SurveyRepository};

#[derive(Debug, Default, Clone)]
pub struct InMemoryEventRepository {
    events: Arc<RwLock<HashMap<String, Event>>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn create(&self, event: Event) -> EventResult<Event> {
        self.events
            .write()
            .await
            .insert(event.id.clone(), event.clone());
        Ok(event)
    }

    async fn get_by_id(&self, id: &str) -> EventResult<Option<Event>> {
        Ok(self.events.read().await.get(id).cloned())
    }

    async fn update(&self, event: &Event) -> EventResult<()> {
        match self.events.write().await.get_mut(&event.id) {
            Some(stored) => {
                *stored = event.clone();
                Ok(())
            }
            None => Err(EventError::EventNotFound(event.id.clone())),
        }
    }

    async fn find_by_owner(&self, user_id: &str) -> EventResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .events
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start);
        Ok(events)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemorySurveyRepository {
    surveys: Arc<RwLock<HashMap<String, Survey>>>,
}

impl InMemorySurveyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SurveyRepository for InMemorySurveyRepository {
    async fn create(&self, survey: Survey) -> EventResult<Survey> {
        self.surveys
            .write()
            .await
            .insert(survey.id.clone(), survey.clone());
        Ok(survey)
    }

    async fn get_by_id(&self, id: &str) -> EventResult<Option<Survey>> {
        Ok(self.surveys.read().await.get(id).cloned())
    }

    async fn update(&self, survey: &Survey) -> EventResult<()> {
        match self.surveys.write().await.get_mut(&survey.id) {
            Some(stored) => {
                *stored = survey.clone();
                Ok(())
            }
            None => Err(EventError::SurveyNotFound(survey.id.clone())),
        }
    }

    async fn find_by_owner(&self, user_id: &str) -> EventResult<Vec<Survey>> {
        let mut surveys: Vec<Survey> = self
            .surveys
            .read()
            .await
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        surveys.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(surveys)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryQuestionRepository {
    questions: Arc<RwLock<HashMap<String, SurveyQuestion>>>,
}

impl InMemoryQuestionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn create(&self, question: SurveyQuestion) -> EventResult<SurveyQuestion> {
        self.questions
            .write()
            .await
            .insert(question.id.clone(), question.clone());
        Ok(question)
    }

    async fn get_by_id(&self, id: &str) -> EventResult<Option<SurveyQuestion>> {
        Ok(self.questions.read().await.get(id).cloned())
    }

    async fn update(&self, question: &SurveyQuestion) -> EventResult<()> {
        match self.questions.write().await.get_mut(&question.id) {
            Some(stored) => {
                *stored = question.clone();
                Ok(())
            }
            None => Err(EventError::QuestionNotFound(question.id.clone())),
        }
    }

    async fn delete(&self, id: &str) -> EventResult<bool> {
        Ok(self.questions.write().await.remove(id).is_some())
    }

    async fn find_by_survey(&self, survey_id: &str) -> EventResult<Vec<SurveyQuestion>> {
        let mut questions: Vec<SurveyQuestion> = self
            .questions
            .read()
            .await
            .values()
            .filter(|q| q.survey_id == survey_id)
            .cloned()
            .collect();
        questions.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(questions)
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryAnswerRepository {
    answers: Arc<RwLock<Vec<SurveyAnswer>>>,
}

impl InMemoryAnswerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnswerRepository for InMemoryAnswerRepository {
    async fn upsert(&self, answer: SurveyAnswer) -> EventResult<()> {
        let mut answers = self.answers.write().await;
        let existing = answers.iter_mut().find(|a| {
            a.survey_id == answer.survey_id
                && a.question_id == answer.question_id
                && a.visitor_id == answer.visitor_id
        });
        match existing {
            Some(stored) => {
                stored.value = answer.value;
                stored.updated_at = answer.updated_at;
            }
            None => answers.push(answer),
        }
        Ok(())
    }

    async fn find_for_visitor(
        &self,
        visitor_id: &str,
        survey_id: &str,
    ) -> EventResult<Vec<SurveyAnswer>> {
        Ok(self
            .answers
            .read()
            .await
            .iter()
            .filter(|a| a.visitor_id == visitor_id && a.survey_id == survey_id)
            .cloned()
            .collect())
    }
}
