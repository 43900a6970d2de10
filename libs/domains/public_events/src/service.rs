use chrono::Utc;
use domain_visitors::{
    RegistrationOutcome, SourceType, UserAgentInfo, VisitorFields, VisitorRegistration,
    VisitorRegistry, VisitorRepository, VisitorScope,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{EventError, EventResult};
use crate::models::{
    Event, EventChanges, EventDraft, EventFullInfo, EventVisitorRegistration, QuestionChanges,
    QuestionDraft, Survey, SurveyAnswer, SurveyInfo, SurveyQuestion, check_schedule,
    start_of_today,
};
use crate::repository::{AnswerRepository, EventRepository, QuestionRepository, SurveyRepository};

/// Events, their surveys and visitor registration.
///
/// Ownership is not checked here: callers load an object, run the
/// authorization guards against it and then hand it back for mutation.
#[derive(Clone)]
pub struct PublicEventService {
    events: Arc<dyn EventRepository>,
    surveys: Arc<dyn SurveyRepository>,
    questions: Arc<dyn QuestionRepository>,
    answers: Arc<dyn AnswerRepository>,
    visitors: VisitorRegistry<dyn VisitorRepository>,
}

impl PublicEventService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        surveys: Arc<dyn SurveyRepository>,
        questions: Arc<dyn QuestionRepository>,
        answers: Arc<dyn AnswerRepository>,
        visitors: Arc<dyn VisitorRepository>,
    ) -> Self {
        Self {
            events,
            surveys,
            questions,
            answers,
            visitors: VisitorRegistry::from_arc(visitors),
        }
    }

    pub async fn create_event(&self, owner_id: &str, draft: EventDraft) -> EventResult<Event> {
        check_schedule(draft.start, draft.end, Some(start_of_today()))?;
        let event = self.events.create(Event::new(owner_id, draft)).await?;
        info!(event_id = %event.id, user_id = %owner_id, "Event created");
        Ok(event)
    }

    pub async fn get_event(&self, id: &str) -> EventResult<Event> {
        self.events
            .get_by_id(id)
            .await?
            .ok_or_else(|| EventError::EventNotFound(id.to_string()))
    }

    pub async fn update_event(&self, mut event: Event, changes: EventChanges) -> EventResult<Event> {
        if changes.start.is_some() || changes.end.is_some() {
            check_schedule(
                changes.start.unwrap_or(event.start),
                changes.end.unwrap_or(event.end),
                None,
            )?;
        }

        if let Some(name) = changes.name {
            event.name = name;
        }
        if let Some(description) = changes.description {
            event.description = description;
        }
        if let Some(place) = changes.place {
            if let Some(name) = place.name {
                event.place.name = name;
            }
            if let Some(address) = place.address {
                event.place.address = address;
            }
            if place.location.is_some() {
                event.place.location = place.location;
            }
        }
        if let Some(start) = changes.start {
            event.start = start;
        }
        if let Some(end) = changes.end {
            event.end = end;
        }
        match changes.survey_id {
            Some(id) if id.is_empty() => event.survey_id = None,
            Some(id) => event.survey_id = Some(id),
            None => {}
        }
        event.updated_at = Utc::now();

        self.events.update(&event).await?;
        info!(event_id = %event.id, "Event updated");
        Ok(event)
    }

    pub async fn events_of(&self, user_id: &str) -> EventResult<Vec<Event>> {
        self.events.find_by_owner(user_id).await
    }

    /// Public view of an event with its survey and ordered questions.
    pub async fn event_full_info(&self, id: &str) -> EventResult<EventFullInfo> {
        let event = self.get_event(id).await?;
        let survey = match &event.survey_id {
            Some(survey_id) => match self.surveys.get_by_id(survey_id).await? {
                Some(survey) => Some(self.survey_with_questions(&survey).await?),
                None => None,
            },
            None => None,
        };
        Ok(event.full_info(survey))
    }

    /// A survey an event is about to reference. Unknown ids are a caller error.
    pub async fn referenced_survey(&self, id: &str) -> EventResult<Survey> {
        self.surveys
            .get_by_id(id)
            .await?
            .ok_or_else(|| EventError::UnknownSurvey(id.to_string()))
    }

    pub async fn create_survey(
        &self,
        owner_id: &str,
        name: String,
        description: Option<String>,
    ) -> EventResult<Survey> {
        let survey = self
            .surveys
            .create(Survey::new(owner_id, name, description))
            .await?;
        info!(survey_id = %survey.id, user_id = %owner_id, "Survey created");
        Ok(survey)
    }

    pub async fn get_survey(&self, id: &str) -> EventResult<Survey> {
        self.surveys
            .get_by_id(id)
            .await?
            .ok_or_else(|| EventError::SurveyNotFound(id.to_string()))
    }

    pub async fn survey_with_questions(&self, survey: &Survey) -> EventResult<SurveyInfo> {
        let questions = self.questions.find_by_survey(&survey.id).await?;
        Ok(survey.info_with_questions(&questions))
    }

    pub async fn update_survey(
        &self,
        mut survey: Survey,
        name: Option<String>,
        description: Option<String>,
    ) -> EventResult<Survey> {
        if let Some(name) = name {
            survey.name = name;
        }
        if let Some(description) = description {
            survey.description = Some(description);
        }
        survey.updated_at = Utc::now();
        self.surveys.update(&survey).await?;
        Ok(survey)
    }

    pub async fn surveys_of(&self, user_id: &str) -> EventResult<Vec<Survey>> {
        self.surveys.find_by_owner(user_id).await
    }

    pub async fn create_question(
        &self,
        survey: &Survey,
        draft: QuestionDraft,
    ) -> EventResult<SurveyQuestion> {
        let question = self
            .questions
            .create(SurveyQuestion::new(&survey.id, draft)?)
            .await?;
        info!(question_id = %question.id, survey_id = %survey.id, "Survey question created");
        Ok(question)
    }

    /// A question together with the survey that owns it.
    pub async fn get_question(&self, id: &str) -> EventResult<(SurveyQuestion, Survey)> {
        let question = self
            .questions
            .get_by_id(id)
            .await?
            .ok_or_else(|| EventError::QuestionNotFound(id.to_string()))?;
        let survey = self.get_survey(&question.survey_id).await?;
        Ok((question, survey))
    }

    pub async fn update_question(
        &self,
        mut question: SurveyQuestion,
        changes: QuestionChanges,
    ) -> EventResult<SurveyQuestion> {
        question.apply(changes)?;
        self.questions.update(&question).await?;
        Ok(question)
    }

    /// Sets `display_order` to each question's index in `ordered_ids`.
    /// Every question of the survey must be listed.
    pub async fn set_question_order(
        &self,
        survey: &Survey,
        ordered_ids: &[String],
    ) -> EventResult<()> {
        let questions = self.questions.find_by_survey(&survey.id).await?;

        let mut reordered = Vec::with_capacity(questions.len());
        for mut question in questions {
            let position = ordered_ids
                .iter()
                .position(|id| *id == question.id)
                .ok_or_else(|| EventError::IncompleteOrder(question.id.clone()))?;
            let order = i32::try_from(position)
                .map_err(|_| EventError::Internal("too many questions".to_string()))?;
            if question.display_order != order {
                question.display_order = order;
                question.updated_at = Utc::now();
                reordered.push(question);
            }
        }

        for question in &reordered {
            self.questions.update(question).await?;
        }
        debug!(survey_id = %survey.id, changed = reordered.len(), "Survey questions reordered");
        Ok(())
    }

    pub async fn remove_question(&self, question: &SurveyQuestion) -> EventResult<()> {
        if !self.questions.delete(&question.id).await? {
            return Err(EventError::QuestionNotFound(question.id.clone()));
        }
        info!(question_id = %question.id, survey_id = %question.survey_id, "Survey question removed");
        Ok(())
    }

    /// Registers a visitor of a known event and stores the answers to the
    /// event's survey. Answers to foreign questions are dropped.
    pub async fn register_event_visitor(
        &self,
        registration: EventVisitorRegistration,
        ua_info: Option<UserAgentInfo>,
        remote_address: Option<String>,
    ) -> EventResult<RegistrationOutcome> {
        let event = self
            .events
            .get_by_id(&registration.event_id)
            .await?
            .ok_or_else(|| EventError::UnknownEvent(registration.event_id.clone()))?;

        let outcome = self
            .visitors
            .register_or_update(
                VisitorRegistration::new(VisitorScope::Event(event.id.clone()), registration.visitor)
                    .with_source(registration.source_type, registration.source_data)
                    .with_client(ua_info, remote_address),
            )
            .await?;

        if let Some(survey_id) = &event.survey_id
            && !registration.survey_answers.is_empty()
        {
            let known: HashSet<String> = self
                .questions
                .find_by_survey(survey_id)
                .await?
                .into_iter()
                .map(|q| q.id)
                .collect();

            let mut stored = 0;
            for answer in registration.survey_answers {
                if !known.contains(&answer.question_id) {
                    debug!(question_id = %answer.question_id, "Answer to unknown question skipped");
                    continue;
                }
                self.answers
                    .upsert(SurveyAnswer::new(
                        survey_id,
                        &answer.question_id,
                        &outcome.visitor.id,
                        answer.value,
                    ))
                    .await?;
                stored += 1;
            }
            debug!(visitor_id = %outcome.visitor.id, stored, "Survey answers stored");
        }

        info!(
            event_id = %event.id,
            visitor_id = %outcome.visitor.id,
            submits = outcome.visitor.submits,
            "Event visitor registered"
        );
        Ok(outcome)
    }

    pub async fn register_fast_track_visitor(
        &self,
        visitor: VisitorFields,
        ua_info: Option<UserAgentInfo>,
        remote_address: Option<String>,
    ) -> EventResult<RegistrationOutcome> {
        let outcome = self
            .visitors
            .register_or_update(
                VisitorRegistration::new(VisitorScope::FastTrack, visitor)
                    .with_source(Some(SourceType::FastTrack), None)
                    .with_client(ua_info, remote_address),
            )
            .await?;
        info!(visitor_id = %outcome.visitor.id, submits = outcome.visitor.submits, "Fast-track visitor registered");
        Ok(outcome)
    }

    pub async fn visitor_answers(
        &self,
        visitor_id: &str,
        survey_id: &str,
    ) -> EventResult<Vec<SurveyAnswer>> {
        self.answers.find_for_visitor(visitor_id, survey_id).await
    }
}
