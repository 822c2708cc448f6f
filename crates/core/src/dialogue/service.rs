use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::booking::BookingFinalizer;
use crate::clock::Clock;
use crate::dialogue::engine::DialogueEngine;
use crate::dialogue::prompts::{render, PromptContext};
use crate::dialogue::states::{
    DialogueAction, DialogueOptions, DialogueStep, Transition, TurnEvent,
};
use crate::domain::session::{CallId, Session};
use crate::errors::{ApplicationError, BookingError};
use crate::sessions::{SessionStore, SessionStoreError};
use crate::speech::{
    interpret_yes_no, parse_date_range, parse_guest_count, parse_spoken_email, parse_spoken_name,
    resolve_range,
};

#[derive(Clone, Debug)]
pub struct DialogueSettings {
    pub business_name: String,
    pub time_zone: Tz,
    pub idle_timeout: Duration,
    pub collect_email: bool,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            business_name: PromptContext::default().business_name,
            time_zone: chrono_tz::America::Chicago,
            idle_timeout: Duration::minutes(30),
            collect_email: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRequest {
    pub call_id: CallId,
    pub utterance: Option<String>,
    pub caller: Option<String>,
    pub correlation_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResponse {
    pub prompt: String,
    pub awaiting_input: bool,
    pub step: DialogueStep,
}

/// Runs one caller turn end to end: load the session, interpret the utterance for the current
/// step, apply the transition, run the finalizer when asked to, and persist or drop the
/// session. A turn always produces something to say.
pub struct DialogueService {
    sessions: Arc<dyn SessionStore>,
    finalizer: Arc<BookingFinalizer>,
    clock: Arc<dyn Clock>,
    audit_sink: Arc<dyn AuditSink>,
    engine: DialogueEngine,
    settings: DialogueSettings,
    prompts: PromptContext,
}

impl DialogueService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        finalizer: Arc<BookingFinalizer>,
        clock: Arc<dyn Clock>,
        audit_sink: Arc<dyn AuditSink>,
        settings: DialogueSettings,
    ) -> Self {
        let engine = DialogueEngine::new(DialogueOptions { collect_email: settings.collect_email });
        let prompts = PromptContext { business_name: settings.business_name.clone() };
        Self { sessions, finalizer, clock, audit_sink, engine, settings, prompts }
    }

    pub fn settings(&self) -> &DialogueSettings {
        &self.settings
    }

    pub fn calendar_provider(&self) -> &'static str {
        self.finalizer.calendar_provider()
    }

    /// Waits for guest notifications still in flight from finished calls.
    pub async fn drain_notifications(&self) {
        self.finalizer.drain_notifications().await;
    }

    pub async fn active_sessions(&self) -> Result<usize, SessionStoreError> {
        self.sessions.active_count().await
    }

    pub async fn sweep_expired(&self) -> Result<usize, SessionStoreError> {
        self.sessions.sweep_expired().await
    }

    pub async fn handle_turn(&self, request: TurnRequest) -> TurnResponse {
        let audit = AuditContext::new(
            Some(request.call_id.clone()),
            request.correlation_id.clone(),
            "dialogue-service",
        );

        match self.run_turn(&request, &audit).await {
            Ok(response) => response,
            Err(failure) => {
                error!(
                    event_name = "dialogue.turn_failed",
                    correlation_id = %audit.correlation_id,
                    call_id = %request.call_id,
                    error = %failure,
                    "turn could not be completed"
                );
                if let Err(delete_error) = self.sessions.delete(&request.call_id).await {
                    warn!(
                        event_name = "dialogue.session_cleanup_failed",
                        correlation_id = %audit.correlation_id,
                        error = %delete_error,
                        "could not drop session after failed turn"
                    );
                }
                TurnResponse {
                    prompt: failure.spoken_message().to_owned(),
                    awaiting_input: false,
                    step: DialogueStep::Finalize,
                }
            }
        }
    }

    async fn run_turn(
        &self,
        request: &TurnRequest,
        audit: &AuditContext,
    ) -> Result<TurnResponse, ApplicationError> {
        let now = self.clock.now();
        let stored = self.sessions.get(&request.call_id).await.map_err(store_failure)?;
        let mut session = match stored {
            Some(session) => session,
            None => {
                self.audit_sink.emit(AuditEvent::new(
                    audit,
                    "dialogue.session_started",
                    AuditCategory::Ingress,
                    AuditOutcome::Success,
                ));
                Session::new(
                    request.call_id.clone(),
                    request.caller.clone(),
                    now,
                    self.settings.idle_timeout,
                )
            }
        };
        if session.caller.is_none() {
            session.caller = request.caller.clone().filter(|value| !value.trim().is_empty());
        }

        let utterance = request.utterance.as_deref().map(str::trim).unwrap_or_default();
        let event = if utterance.is_empty() {
            if session.turns == 0 {
                TurnEvent::CallStarted
            } else {
                TurnEvent::Silence
            }
        } else {
            let today = self.clock.today_in(self.settings.time_zone);
            self.interpret(session.step, utterance, today, audit).await
        };

        let mut transition = self.engine.apply_with_audit(
            session.step,
            &session.draft,
            event,
            self.audit_sink.as_ref(),
            audit,
        );

        if transition.action == Some(DialogueAction::RunFinalizer) {
            let outcome = self.run_finalizer(&transition, session.caller.as_deref(), audit).await;
            transition = self.engine.apply_with_audit(
                transition.to,
                &transition.draft,
                outcome,
                self.audit_sink.as_ref(),
                audit,
            );
        }

        info!(
            event_name = "dialogue.turn_handled",
            correlation_id = %audit.correlation_id,
            call_id = %request.call_id,
            from = ?transition.from,
            to = ?transition.to,
            turn_event = transition.event.kind(),
            "caller turn handled"
        );

        let prompt = render(&transition.prompt, &self.prompts);
        let step = transition.to;

        if transition.action == Some(DialogueAction::EndCall) {
            self.sessions.delete(&request.call_id).await.map_err(store_failure)?;
            self.audit_sink.emit(AuditEvent::new(
                audit,
                "dialogue.session_closed",
                AuditCategory::Dialogue,
                AuditOutcome::Success,
            ));
            return Ok(TurnResponse { prompt, awaiting_input: false, step });
        }

        session.step = step;
        session.draft = transition.draft;
        session.touch(now, self.settings.idle_timeout);
        self.sessions.put(session).await.map_err(store_failure)?;

        Ok(TurnResponse { prompt, awaiting_input: true, step })
    }

    async fn interpret(
        &self,
        step: DialogueStep,
        utterance: &str,
        today: NaiveDate,
        audit: &AuditContext,
    ) -> TurnEvent {
        match step {
            DialogueStep::AwaitDates => {
                let Some(range) = parse_date_range(utterance) else {
                    return TurnEvent::NotRecognized(step.expected_field());
                };
                let dates = match resolve_range(&range, today) {
                    Ok(dates) => dates,
                    Err(_) => return TurnEvent::InvalidDate,
                };
                match self.finalizer.check_availability(&dates, audit).await {
                    Ok(()) => TurnEvent::DatesAvailable(dates),
                    Err(BookingError::DatesUnavailable { .. }) => TurnEvent::DatesConflict(dates),
                    Err(failure) => {
                        error!(
                            event_name = "calendar.availability_failed",
                            correlation_id = %audit.correlation_id,
                            error = %failure,
                            "availability lookup failed"
                        );
                        TurnEvent::BackendFailed
                    }
                }
            }
            DialogueStep::AwaitGuests => parse_guest_count(utterance)
                .map(TurnEvent::GuestsGiven)
                .unwrap_or(TurnEvent::NotRecognized(step.expected_field())),
            DialogueStep::AwaitName | DialogueStep::AwaitNameSpelled => parse_spoken_name(utterance)
                .map(TurnEvent::NameGiven)
                .unwrap_or(TurnEvent::NotRecognized(step.expected_field())),
            DialogueStep::AwaitEmail => parse_spoken_email(utterance)
                .map(TurnEvent::EmailGiven)
                .unwrap_or(TurnEvent::NotRecognized(step.expected_field())),
            DialogueStep::AwaitNameConfirm
            | DialogueStep::AwaitSpelledConfirm
            | DialogueStep::AwaitEmailConfirm => TurnEvent::Answer(interpret_yes_no(utterance)),
            DialogueStep::Finalize => TurnEvent::Silence,
        }
    }

    async fn run_finalizer(
        &self,
        transition: &Transition,
        caller: Option<&str>,
        audit: &AuditContext,
    ) -> TurnEvent {
        let record = match transition.draft.to_record(caller) {
            Ok(record) => record,
            Err(invalid) => {
                error!(
                    event_name = "booking.draft_incomplete",
                    correlation_id = %audit.correlation_id,
                    error = %invalid,
                    "confirmed draft could not become a booking"
                );
                return TurnEvent::BackendFailed;
            }
        };

        match self.finalizer.finalize(&record, audit).await {
            Ok(_) => TurnEvent::BookingCommitted,
            Err(BookingError::DatesUnavailable { .. }) => TurnEvent::BookingConflict,
            Err(failure) => {
                error!(
                    event_name = "booking.finalize_failed",
                    correlation_id = %audit.correlation_id,
                    error = %failure,
                    "booking could not be saved"
                );
                TurnEvent::BackendFailed
            }
        }
    }
}

fn store_failure(error: SessionStoreError) -> ApplicationError {
    ApplicationError::SessionStore(error.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::{DialogueService, DialogueSettings, TurnRequest};
    use crate::audit::InMemoryAuditSink;
    use crate::booking::BookingFinalizer;
    use crate::calendar::InMemoryCalendar;
    use crate::clock::ManualClock;
    use crate::dialogue::states::DialogueStep;
    use crate::domain::session::CallId;
    use crate::notify::RecordingNotifier;
    use crate::sessions::{InMemorySessionStore, SessionStore};

    struct Harness {
        service: DialogueService,
        calendar: Arc<InMemoryCalendar>,
        sessions: Arc<InMemorySessionStore>,
    }

    fn harness(settings: DialogueSettings) -> Harness {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 17, 0, 0).unwrap()));
        let calendar = Arc::new(InMemoryCalendar::default());
        let sessions = Arc::new(InMemorySessionStore::new(clock.clone()));
        let sink = Arc::new(InMemoryAuditSink::default());
        let finalizer = Arc::new(BookingFinalizer::new(
            calendar.clone(),
            Arc::new(RecordingNotifier::default()),
            sink.clone(),
            "Lakeside Cabins",
        ));
        let service = DialogueService::new(sessions.clone(), finalizer, clock, sink, settings);
        Harness { service, calendar, sessions }
    }

    fn turn(utterance: &str) -> TurnRequest {
        TurnRequest {
            call_id: CallId("CA-svc".to_owned()),
            utterance: Some(utterance.to_owned()),
            caller: Some("+15125550100".to_owned()),
            correlation_id: "req-svc".to_owned(),
        }
    }

    #[tokio::test]
    async fn first_silent_turn_greets_the_caller() {
        let harness = harness(DialogueSettings::default());

        let response = harness.service.handle_turn(turn("")).await;

        assert!(response.awaiting_input);
        assert_eq!(response.step, DialogueStep::AwaitDates);
        assert!(response.prompt.starts_with("Hello, welcome to"));

        let replay = harness.service.handle_turn(turn("  ")).await;
        assert_eq!(replay.prompt, "What are your check-in and check-out dates?");
    }

    #[tokio::test]
    async fn unparsed_dates_keep_asking() {
        let harness = harness(DialogueSettings::default());

        let response = harness.service.handle_turn(turn("sometime next month")).await;

        assert_eq!(response.step, DialogueStep::AwaitDates);
        assert!(response.prompt.starts_with("Sorry, I didn't catch the dates."));
    }

    #[tokio::test]
    async fn impossible_dates_are_reported() {
        let harness = harness(DialogueSettings::default());

        let response = harness.service.handle_turn(turn("february 30th to march 2nd")).await;

        assert_eq!(response.step, DialogueStep::AwaitDates);
        assert!(response.prompt.starts_with("That doesn't look like a real calendar date."));
    }

    #[tokio::test]
    async fn calendar_outage_during_date_check_ends_the_call() {
        let harness = harness(DialogueSettings::default());
        harness.calendar.set_unavailable(true);

        let response = harness.service.handle_turn(turn("august 10th through the 12th")).await;

        assert!(!response.awaiting_input);
        assert!(response.prompt.contains("issue saving your booking"));
        assert_eq!(harness.sessions.active_count().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn collects_email_when_enabled() {
        let harness = harness(DialogueSettings { collect_email: true, ..DialogueSettings::default() });

        for utterance in ["", "august 10th through the 12th", "two guests", "bee cee", "yes"] {
            harness.service.handle_turn(turn(utterance)).await;
        }
        let ask = harness.service.handle_turn(turn("bc at example dot com")).await;
        assert_eq!(ask.step, DialogueStep::AwaitEmailConfirm);
        assert_eq!(ask.prompt, "I have bc at example dot com. Is that correct?");

        let done = harness.service.handle_turn(turn("yes")).await;
        assert!(!done.awaiting_input);
        assert!(done.prompt.starts_with("Thank you, Bc."));
        assert_eq!(harness.calendar.inserted().await.len(), 1);
        assert!(harness.calendar.inserted().await[0].description.contains("Email: bc@example.com"));
    }
}
