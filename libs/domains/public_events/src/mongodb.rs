//! MongoDB implementations of the public events repositories

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{doc, to_bson},
    options::IndexOptions,
};
use tracing::instrument;

use crate::error::{EventError, EventResult};
use crate::models::{Event, Survey, SurveyAnswer, SurveyQuestion};
use crate::repository::{AnswerRepository, EventRepository, QuestionRepository, SurveyRepository};

pub const EVENTS_COLLECTION: &str = "public-events";
pub const SURVEYS_COLLECTION: &str = "surveys";
pub const QUESTIONS_COLLECTION: &str = "survey-questions";
pub const ANSWERS_COLLECTION: &str = "survey-answers";

pub struct MongoEventRepository {
    collection: Collection<Event>,
}

impl MongoEventRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<Event>(EVENTS_COLLECTION),
        }
    }

    pub async fn create_indexes(&self) -> EventResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "userId": 1, "start": 1 })
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }
}

#[async_trait]
impl EventRepository for MongoEventRepository {
    #[instrument(skip(self, event), fields(id = %event.id, user_id = %event.user_id))]
    async fn create(&self, event: Event) -> EventResult<Event> {
        self.collection.insert_one(&event).await?;
        Ok(event)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> EventResult<Option<Event>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    #[instrument(skip(self, event), fields(id = %event.id))]
    async fn update(&self, event: &Event) -> EventResult<()> {
        let result = self
            .collection
            .replace_one(doc! { "_id": &event.id }, event)
            .await?;
        if result.matched_count == 0 {
            return Err(EventError::EventNotFound(event.id.clone()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_owner(&self, user_id: &str) -> EventResult<Vec<Event>> {
        let cursor = self
            .collection
            .find(doc! { "userId": user_id })
            .sort(doc! { "start": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

pub struct MongoSurveyRepository {
    collection: Collection<Survey>,
}

impl MongoSurveyRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<Survey>(SURVEYS_COLLECTION),
        }
    }

    pub async fn create_indexes(&self) -> EventResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "userId": 1, "updatedAt": -1 })
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }
}

#[async_trait]
impl SurveyRepository for MongoSurveyRepository {
    #[instrument(skip(self, survey), fields(id = %survey.id, user_id = %survey.user_id))]
    async fn create(&self, survey: Survey) -> EventResult<Survey> {
        self.collection.insert_one(&survey).await?;
        Ok(survey)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> EventResult<Option<Survey>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    #[instrument(skip(self, survey), fields(id = %survey.id))]
    async fn update(&self, survey: &Survey) -> EventResult<()> {
        let result = self
            .collection
            .replace_one(doc! { "_id": &survey.id }, survey)
            .await?;
        if result.matched_count == 0 {
            return Err(EventError::SurveyNotFound(survey.id.clone()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_owner(&self, user_id: &str) -> EventResult<Vec<Survey>> {
        let cursor = self
            .collection
            .find(doc! { "userId": user_id })
            .sort(doc! { "updatedAt": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

pub struct MongoQuestionRepository {
    collection: Collection<SurveyQuestion>,
}

impl MongoQuestionRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<SurveyQuestion>(QUESTIONS_COLLECTION),
        }
    }

    pub async fn create_indexes(&self) -> EventResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "surveyId": 1, "displayOrder": 1 })
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for MongoQuestionRepository {
    #[instrument(skip(self, question), fields(id = %question.id, survey_id = %question.survey_id))]
    async fn create(&self, question: SurveyQuestion) -> EventResult<SurveyQuestion> {
        self.collection.insert_one(&question).await?;
        Ok(question)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> EventResult<Option<SurveyQuestion>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    #[instrument(skip(self, question), fields(id = %question.id))]
    async fn update(&self, question: &SurveyQuestion) -> EventResult<()> {
        let result = self
            .collection
            .replace_one(doc! { "_id": &question.id }, question)
            .await?;
        if result.matched_count == 0 {
            return Err(EventError::QuestionNotFound(question.id.clone()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> EventResult<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self))]
    async fn find_by_survey(&self, survey_id: &str) -> EventResult<Vec<SurveyQuestion>> {
        let cursor = self
            .collection
            .find(doc! { "surveyId": survey_id })
            .sort(doc! { "displayOrder": 1, "_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

pub struct MongoAnswerRepository {
    collection: Collection<SurveyAnswer>,
}

impl MongoAnswerRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<SurveyAnswer>(ANSWERS_COLLECTION),
        }
    }

    pub async fn create_indexes(&self) -> EventResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "surveyId": 1, "questionId": 1, "visitorId": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("answer_unique".to_string())
                    .build(),
            )
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }
}

#[async_trait]
impl AnswerRepository for MongoAnswerRepository {
    #[instrument(skip(self, answer), fields(question_id = %answer.question_id, visitor_id = %answer.visitor_id))]
    async fn upsert(&self, answer: SurveyAnswer) -> EventResult<()> {
        let filter = doc! {
            "surveyId": &answer.survey_id,
            "questionId": &answer.question_id,
            "visitorId": &answer.visitor_id,
        };
        let update = doc! {
            "$set": {
                "value": to_bson(&answer.value)?,
                "updatedAt": to_bson(&answer.updated_at)?,
            },
            "$setOnInsert": { "_id": &answer.id },
        };
        self.collection.update_one(filter, update).upsert(true).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_for_visitor(
        &self,
        visitor_id: &str,
        survey_id: &str,
    ) -> EventResult<Vec<SurveyAnswer>> {
        let cursor = self
            .collection
            .find(doc! { "visitorId": visitor_id, "surveyId": survey_id })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}
