//! The `events` dispatch target.

use api_dispatch::{
    ActionRegistry, ApiResult, RequestContext, require_admin, require_authenticated,
    require_ownership,
};
use chrono::{DateTime, Utc};
use domain_visitors::{SourceType, UserAgentInfo, VisitorFields};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};
use validator::Validate;

use crate::models::{
    AnswerType, EventChanges, EventDraft, EventFullInfo, EventInfo, EventVisitorRegistration,
    Place, PlaceUpdate, QuestionChanges, QuestionDraft, SurveyAnswerInput, SurveyInfo,
    SurveyQuestionInfo, VisitorInfo,
};
use crate::service::PublicEventService;

pub const TARGET: &str = "events";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum EventsAction {
    CreateEvent,
    UpdateEvent,
    GetEvents,
    GetEvent,
    GetEventFullInfo,
    CreateSurvey,
    UpdateSurvey,
    GetSurveys,
    GetSurvey,
    CreateSurveyQuestion,
    UpdateSurveyQuestion,
    SetSurveyQuestionsSortOrder,
    RemoveSurveyQuestion,
    RegisterEventVisitor,
    RegisterFastTrackVisitor,
}

pub fn registry(service: Arc<PublicEventService>) -> ActionRegistry<EventsAction, PublicEventService> {
    ActionRegistry::new(TARGET, service)
        .validated(EventsAction::CreateEvent, create_event)
        .validated(EventsAction::UpdateEvent, update_event)
        .validated(EventsAction::GetEvents, get_events)
        .validated(EventsAction::GetEvent, get_event)
        .validated(EventsAction::GetEventFullInfo, get_event_full_info)
        .validated(EventsAction::CreateSurvey, create_survey)
        .validated(EventsAction::UpdateSurvey, update_survey)
        .validated(EventsAction::GetSurveys, get_surveys)
        .validated(EventsAction::GetSurvey, get_survey)
        .validated(EventsAction::CreateSurveyQuestion, create_survey_question)
        .validated(EventsAction::UpdateSurveyQuestion, update_survey_question)
        .validated(EventsAction::SetSurveyQuestionsSortOrder, set_questions_sort_order)
        .validated(EventsAction::RemoveSurveyQuestion, remove_survey_question)
        .validated(EventsAction::RegisterEventVisitor, register_event_visitor)
        .validated(EventsAction::RegisterFastTrackVisitor, register_fast_track_visitor)
}

#[derive(Debug, Serialize)]
pub struct Empty {}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub event: EventInfo,
}

#[derive(Debug, Serialize)]
pub struct EventFullInfoResponse {
    pub event: EventFullInfo,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<EventInfo>,
}

#[derive(Debug, Serialize)]
pub struct SurveyResponse {
    pub survey: SurveyInfo,
}

#[derive(Debug, Serialize)]
pub struct SurveysResponse {
    pub surveys: Vec<SurveyInfo>,
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub question: SurveyQuestionInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorResponse {
    pub visitor: VisitorInfo,
    pub already_registered: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FastTrackResponse {
    pub visitor_id: String,
    pub already_registered: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct IdParams {
    #[validate(length(min = 1))]
    pub id: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OwnerParams {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventParams {
    #[validate(length(min = 1, max = 500))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(nested)]
    pub place: Place,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub survey_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventParams {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1, max = 500))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(nested)]
    pub place: Option<PlaceUpdate>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Empty string detaches the survey.
    pub survey_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSurveyParams {
    #[validate(length(min = 1, max = 500))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSurveyParams {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1, max = 500))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionParams {
    #[validate(length(min = 1))]
    pub survey_id: String,
    #[validate(length(min = 1))]
    pub text: String,
    pub description: Option<String>,
    pub answer_type: AnswerType,
    #[serde(default)]
    pub answer_variants: Vec<String>,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionParams {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub text: Option<String>,
    pub description: Option<String>,
    pub answer_type: Option<AnswerType>,
    pub answer_variants: Option<Vec<String>>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SortOrderParams {
    #[validate(length(min = 1))]
    pub survey_id: String,
    #[serde(rename = "questionIDs")]
    pub question_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterEventVisitorParams {
    #[validate(length(min = 1))]
    pub event_id: String,
    #[validate(nested)]
    pub visitor: VisitorFields,
    pub source_type: Option<SourceType>,
    pub source_data: Option<serde_json::Value>,
    #[serde(default)]
    pub survey_answers: Vec<SurveyAnswerInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FastTrackParams {
    #[validate(nested)]
    pub visitor: VisitorFields,
}

/// Whose objects to list: the caller's own, or anyone's for admins.
fn resolve_owner(ctx: &RequestContext, user_id: Option<&str>) -> ApiResult<String> {
    let caller = require_authenticated(ctx)?;
    match user_id {
        Some(id) if id != caller.id => {
            require_admin(ctx)?;
            Ok(id.to_string())
        }
        _ => Ok(caller.id.clone()),
    }
}

/// The survey an event is about to reference must exist and belong to the caller.
async fn check_survey_reference(
    service: &PublicEventService,
    ctx: &RequestContext,
    survey_id: &str,
) -> ApiResult<()> {
    let survey = service.referenced_survey(survey_id).await?;
    require_ownership(ctx, &survey)?;
    Ok(())
}

async fn create_event(
    service: Arc<PublicEventService>,
    p: CreateEventParams,
    ctx: RequestContext,
) -> ApiResult<EventResponse> {
    let caller = require_authenticated(&ctx)?;
    let survey_id = p.survey_id.filter(|id| !id.is_empty());
    if let Some(survey_id) = &survey_id {
        check_survey_reference(&service, &ctx, survey_id).await?;
    }

    let event = service
        .create_event(
            &caller.id,
            EventDraft {
                name: p.name,
                description: p.description,
                place: p.place,
                start: p.start,
                end: p.end,
                survey_id,
            },
        )
        .await?;
    Ok(EventResponse { event: event.info() })
}

async fn update_event(
    service: Arc<PublicEventService>,
    p: UpdateEventParams,
    ctx: RequestContext,
) -> ApiResult<EventResponse> {
    let event = service.get_event(&p.id).await?;
    require_ownership(&ctx, &event)?;
    if let Some(survey_id) = p.survey_id.as_deref().filter(|id| !id.is_empty()) {
        check_survey_reference(&service, &ctx, survey_id).await?;
    }

    let event = service
        .update_event(
            event,
            EventChanges {
                name: p.name,
                description: p.description,
                place: p.place,
                start: p.start,
                end: p.end,
                survey_id: p.survey_id,
            },
        )
        .await?;
    Ok(EventResponse { event: event.info() })
}

async fn get_events(
    service: Arc<PublicEventService>,
    p: OwnerParams,
    ctx: RequestContext,
) -> ApiResult<EventsResponse> {
    let owner = resolve_owner(&ctx, p.user_id.as_deref())?;
    let events = service.events_of(&owner).await?;
    Ok(EventsResponse {
        events: events.iter().map(|e| e.info()).collect(),
    })
}

async fn get_event(
    service: Arc<PublicEventService>,
    p: IdParams,
    ctx: RequestContext,
) -> ApiResult<EventResponse> {
    require_authenticated(&ctx)?;
    let event = service.get_event(&p.id).await?;
    require_ownership(&ctx, &event)?;
    Ok(EventResponse { event: event.info() })
}

async fn get_event_full_info(
    service: Arc<PublicEventService>,
    p: IdParams,
    _ctx: RequestContext,
) -> ApiResult<EventFullInfoResponse> {
    Ok(EventFullInfoResponse {
        event: service.event_full_info(&p.id).await?,
    })
}

async fn create_survey(
    service: Arc<PublicEventService>,
    p: CreateSurveyParams,
    ctx: RequestContext,
) -> ApiResult<SurveyResponse> {
    let caller = require_authenticated(&ctx)?;
    let survey = service
        .create_survey(&caller.id, p.name, p.description)
        .await?;
    Ok(SurveyResponse {
        survey: survey.info(),
    })
}

async fn update_survey(
    service: Arc<PublicEventService>,
    p: UpdateSurveyParams,
    ctx: RequestContext,
) -> ApiResult<SurveyResponse> {
    require_authenticated(&ctx)?;
    let survey = service.get_survey(&p.id).await?;
    require_ownership(&ctx, &survey)?;
    let survey = service.update_survey(survey, p.name, p.description).await?;
    Ok(SurveyResponse {
        survey: survey.info(),
    })
}

async fn get_surveys(
    service: Arc<PublicEventService>,
    p: OwnerParams,
    ctx: RequestContext,
) -> ApiResult<SurveysResponse> {
    let owner = resolve_owner(&ctx, p.user_id.as_deref())?;
    let surveys = service.surveys_of(&owner).await?;
    Ok(SurveysResponse {
        surveys: surveys.iter().map(|s| s.info()).collect(),
    })
}

async fn get_survey(
    service: Arc<PublicEventService>,
    p: IdParams,
    ctx: RequestContext,
) -> ApiResult<SurveyResponse> {
    require_authenticated(&ctx)?;
    let survey = service.get_survey(&p.id).await?;
    require_ownership(&ctx, &survey)?;
    Ok(SurveyResponse {
        survey: service.survey_with_questions(&survey).await?,
    })
}

async fn create_survey_question(
    service: Arc<PublicEventService>,
    p: CreateQuestionParams,
    ctx: RequestContext,
) -> ApiResult<QuestionResponse> {
    let survey = service.get_survey(&p.survey_id).await?;
    require_ownership(&ctx, &survey)?;
    let question = service
        .create_question(
            &survey,
            QuestionDraft {
                text: p.text,
                description: p.description,
                answer_type: p.answer_type,
                answer_variants: p.answer_variants,
                display_order: p.display_order,
            },
        )
        .await?;
    Ok(QuestionResponse {
        question: question.info(),
    })
}

async fn update_survey_question(
    service: Arc<PublicEventService>,
    p: UpdateQuestionParams,
    ctx: RequestContext,
) -> ApiResult<QuestionResponse> {
    let (question, survey) = service.get_question(&p.id).await?;
    require_ownership(&ctx, &survey)?;
    let question = service
        .update_question(
            question,
            QuestionChanges {
                text: p.text,
                description: p.description,
                answer_type: p.answer_type,
                answer_variants: p.answer_variants,
                display_order: p.display_order,
            },
        )
        .await?;
    Ok(QuestionResponse {
        question: question.info(),
    })
}

async fn set_questions_sort_order(
    service: Arc<PublicEventService>,
    p: SortOrderParams,
    ctx: RequestContext,
) -> ApiResult<Empty> {
    let survey = service.get_survey(&p.survey_id).await?;
    require_ownership(&ctx, &survey)?;
    service.set_question_order(&survey, &p.question_ids).await?;
    Ok(Empty {})
}

async fn remove_survey_question(
    service: Arc<PublicEventService>,
    p: IdParams,
    ctx: RequestContext,
) -> ApiResult<Empty> {
    let (question, survey) = service.get_question(&p.id).await?;
    require_ownership(&ctx, &survey)?;
    service.remove_question(&question).await?;
    Ok(Empty {})
}

async fn register_event_visitor(
    service: Arc<PublicEventService>,
    p: RegisterEventVisitorParams,
    ctx: RequestContext,
) -> ApiResult<VisitorResponse> {
    let outcome = service
        .register_event_visitor(
            EventVisitorRegistration {
                event_id: p.event_id,
                visitor: p.visitor,
                source_type: p.source_type,
                source_data: p.source_data,
                survey_answers: p.survey_answers,
            },
            UserAgentInfo::from_header(ctx.user_agent()),
            ctx.remote_address.clone(),
        )
        .await?;
    Ok(VisitorResponse {
        visitor: VisitorInfo::from(&outcome.visitor),
        already_registered: outcome.already_registered,
    })
}

async fn register_fast_track_visitor(
    service: Arc<PublicEventService>,
    p: FastTrackParams,
    ctx: RequestContext,
) -> ApiResult<FastTrackResponse> {
    let outcome = service
        .register_fast_track_visitor(
            p.visitor,
            UserAgentInfo::from_header(ctx.user_agent()),
            ctx.remote_address.clone(),
        )
        .await?;
    Ok(FastTrackResponse {
        visitor_id: outcome.visitor.id,
        already_registered: outcome.already_registered,
    })
}
