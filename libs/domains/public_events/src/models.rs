use api_dispatch::Owned;
use chrono::{DateTime, NaiveTime, Utc};
use domain_visitors::{SourceType, VisitorFields, VisitorRecord};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;
use validator::Validate;

use crate::error::{EventError, EventResult};

/// GeoJSON point, `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type", default = "point_kind")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

fn point_kind() -> String {
    "Point".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Place {
    #[validate(length(min = 1, max = 500))]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
pub struct PlaceUpdate {
    #[validate(length(min = 1, max = 500))]
    pub name: Option<String>,
    pub address: Option<String>,
    pub location: Option<GeoPoint>,
}

/// Stored public event. Lives in the `public-events` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub place: Place,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub survey_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Event {
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

impl Event {
    pub fn new(user_id: &str, draft: EventDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.to_string(),
            name: draft.name,
            description: draft.description,
            place: draft.place,
            start: draft.start,
            end: draft.end,
            survey_id: draft.survey_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn info(&self) -> EventInfo {
        EventInfo {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            place: self.place.clone(),
            start: self.start,
            end: self.end,
            survey_id: self.survey_id.clone(),
        }
    }

    /// Public view, with the attached survey if any.
    pub fn full_info(&self, survey: Option<SurveyInfo>) -> EventFullInfo {
        EventFullInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            place: self.place.clone(),
            start: self.start,
            end: self.end,
            survey,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub place: Place,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub survey_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFullInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub place: Place,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey: Option<SurveyInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub name: String,
    pub description: String,
    pub place: Place,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub survey_id: Option<String>,
}

/// Partial event update. An empty `survey_id` detaches the survey.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub place: Option<PlaceUpdate>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub survey_id: Option<String>,
}

/// Start of the current UTC day.
pub fn start_of_today() -> DateTime<Utc> {
    Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// `start` must precede `end`, and must not be earlier than `not_before` when given.
pub fn check_schedule(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    not_before: Option<DateTime<Utc>>,
) -> EventResult<()> {
    if start >= end {
        return Err(EventError::InvalidSchedule(
            "Start time must be earlier than end time".to_string(),
        ));
    }
    if let Some(min) = not_before
        && start < min
    {
        return Err(EventError::InvalidSchedule(
            "Start date cannot be earlier than today".to_string(),
        ));
    }
    Ok(())
}

/// Stored survey. Lives in the `surveys` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Survey {
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

impl Survey {
    pub fn new(user_id: &str, name: String, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.to_string(),
            name,
            description,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn info(&self) -> SurveyInfo {
        SurveyInfo {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            updated_at: self.updated_at,
            questions: None,
        }
    }

    pub fn info_with_questions(&self, questions: &[SurveyQuestion]) -> SurveyInfo {
        SurveyInfo {
            questions: Some(questions.iter().map(SurveyQuestion::info).collect()),
            ..self.info()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyInfo {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<SurveyQuestionInfo>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum AnswerType {
    YesNo,
    OneOf,
    SomeOf,
}

/// Variants to store for `answer_type`. Choice questions need at least two,
/// yes/no questions keep none.
pub fn checked_variants(answer_type: AnswerType, variants: Vec<String>) -> EventResult<Vec<String>> {
    match answer_type {
        AnswerType::YesNo => Ok(Vec::new()),
        _ if variants.len() < 2 => Err(EventError::NotEnoughVariants(answer_type.to_string())),
        _ => Ok(variants),
    }
}

/// Stored question. Lives in the `survey-questions` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyQuestion {
    #[serde(rename = "_id")]
    pub id: String,
    pub survey_id: String,
    pub text: String,
    #[serde(default)]
    pub description: Option<String>,
    pub answer_type: AnswerType,
    #[serde(default)]
    pub answer_variants: Vec<String>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SurveyQuestion {
    pub fn new(survey_id: &str, draft: QuestionDraft) -> EventResult<Self> {
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7().to_string(),
            survey_id: survey_id.to_string(),
            text: draft.text,
            description: draft.description,
            answer_variants: checked_variants(draft.answer_type, draft.answer_variants)?,
            answer_type: draft.answer_type,
            display_order: draft.display_order,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn info(&self) -> SurveyQuestionInfo {
        SurveyQuestionInfo {
            id: self.id.clone(),
            survey_id: self.survey_id.clone(),
            text: self.text.clone(),
            description: self.description.clone(),
            answer_type: self.answer_type,
            answer_variants: self.answer_variants.clone(),
            display_order: self.display_order,
        }
    }

    /// Applies a partial update. The answer kind is re-checked only when it changes.
    pub fn apply(&mut self, changes: QuestionChanges) -> EventResult<()> {
        if changes.answer_type.is_some() || changes.answer_variants.is_some() {
            let answer_type = changes.answer_type.unwrap_or(self.answer_type);
            let variants = changes
                .answer_variants
                .unwrap_or_else(|| self.answer_variants.clone());
            self.answer_variants = checked_variants(answer_type, variants)?;
            self.answer_type = answer_type;
        }
        if let Some(text) = changes.text {
            self.text = text;
        }
        if let Some(description) = changes.description {
            self.description = Some(description);
        }
        if let Some(order) = changes.display_order {
            self.display_order = order;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyQuestionInfo {
    pub id: String,
    pub survey_id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub answer_type: AnswerType,
    pub answer_variants: Vec<String>,
    pub display_order: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionDraft {
    pub text: String,
    pub description: Option<String>,
    pub answer_type: AnswerType,
    pub answer_variants: Vec<String>,
    pub display_order: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionChanges {
    pub text: Option<String>,
    pub description: Option<String>,
    pub answer_type: Option<AnswerType>,
    pub answer_variants: Option<Vec<String>>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Flag(bool),
    Choice(String),
    Choices(Vec<String>),
}

/// One visitor's answer. Unique per `(survey, question, visitor)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAnswer {
    #[serde(rename = "_id")]
    pub id: String,
    pub survey_id: String,
    pub question_id: String,
    pub visitor_id: String,
    pub value: AnswerValue,
    pub updated_at: DateTime<Utc>,
}

impl SurveyAnswer {
    pub fn new(survey_id: &str, question_id: &str, visitor_id: &str, value: AnswerValue) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            survey_id: survey_id.to_string(),
            question_id: question_id.to_string(),
            visitor_id: visitor_id.to_string(),
            value,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAnswerInput {
    pub question_id: String,
    pub value: AnswerValue,
}

#[derive(Debug, Clone)]
pub struct EventVisitorRegistration {
    pub event_id: String,
    pub visitor: VisitorFields,
    pub source_type: Option<SourceType>,
    pub source_data: Option<serde_json::Value>,
    pub survey_answers: Vec<SurveyAnswerInput>,
}

/// Visitor as shown to the event owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorInfo {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(flatten)]
    pub info: VisitorFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    pub reg_submits: i64,
}

impl From<&VisitorRecord> for VisitorInfo {
    fn from(record: &VisitorRecord) -> Self {
        Self {
            id: record.id.clone(),
            event_id: record.scope.strip_prefix("event:").map(str::to_string),
            info: record.info.clone(),
            source_type: record.source_type,
            reg_submits: record.submits,
        }
    }
}
