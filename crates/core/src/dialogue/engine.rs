use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::dialogue::states::{
    DialogueAction, DialogueOptions, DialogueStep, Prompt, Transition, TurnEvent,
};
use crate::domain::booking::BookingDraft;
use crate::speech::YesNo;

#[derive(Clone, Debug, Default)]
pub struct DialogueEngine {
    options: DialogueOptions,
}

impl DialogueEngine {
    pub fn new(options: DialogueOptions) -> Self {
        Self { options }
    }

    pub fn apply(&self, current: DialogueStep, draft: &BookingDraft, event: TurnEvent) -> Transition {
        transition(current, draft, event, self.options)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: DialogueStep,
        draft: &BookingDraft,
        event: TurnEvent,
        sink: &S,
        audit: &AuditContext,
    ) -> Transition
    where
        S: AuditSink + ?Sized,
    {
        let outcome = self.apply(current, draft, event);
        let replayed = outcome.from == outcome.to && outcome.action.is_none();
        sink.emit(
            AuditEvent::new(
                audit,
                if replayed { "dialogue.prompt_replayed" } else { "dialogue.transition_applied" },
                AuditCategory::Dialogue,
                if replayed { AuditOutcome::Rejected } else { AuditOutcome::Success },
            )
            .with_metadata("from", format!("{:?}", outcome.from))
            .with_metadata("to", format!("{:?}", outcome.to))
            .with_metadata("event", outcome.event.kind()),
        );
        outcome
    }
}

/// Prompt that re-asks whatever `step` is waiting for.
pub fn replay_prompt(step: DialogueStep, draft: &BookingDraft) -> Prompt {
    match step {
        DialogueStep::AwaitDates => Prompt::AskDates,
        DialogueStep::AwaitGuests => Prompt::AskGuests { dates: draft.dates },
        DialogueStep::AwaitName => Prompt::AskName { guests: draft.guests },
        DialogueStep::AwaitNameConfirm => {
            Prompt::ConfirmName { name: draft.name.clone().unwrap_or_default() }
        }
        DialogueStep::AwaitNameSpelled => Prompt::AskNameSpelled,
        DialogueStep::AwaitSpelledConfirm => {
            Prompt::ConfirmSpelledName { name: draft.name.clone().unwrap_or_default() }
        }
        DialogueStep::AwaitEmail => Prompt::AskEmail,
        DialogueStep::AwaitEmailConfirm => {
            Prompt::ConfirmEmail { address: draft.email.clone().unwrap_or_default() }
        }
        DialogueStep::Finalize => Prompt::Finalizing,
    }
}

/// Total transition function over `(step, event)`. Events a step does not expect replay
/// that step's prompt without touching the draft.
pub fn transition(
    current: DialogueStep,
    draft: &BookingDraft,
    event: TurnEvent,
    options: DialogueOptions,
) -> Transition {
    use DialogueStep::{
        AwaitDates, AwaitEmail, AwaitEmailConfirm, AwaitGuests, AwaitName, AwaitNameConfirm,
        AwaitNameSpelled, AwaitSpelledConfirm, Finalize,
    };

    let mut next = draft.clone();
    let mut action = None;

    let (to, prompt) = match (current, &event) {
        (_, TurnEvent::BackendFailed) => {
            action = Some(DialogueAction::EndCall);
            (current, Prompt::Apology)
        }
        (AwaitDates, TurnEvent::CallStarted) => (AwaitDates, Prompt::Greeting),

        (AwaitDates, TurnEvent::DatesAvailable(dates)) => {
            next.dates = Some(*dates);
            // After a lost booking race the remaining fields are already confirmed.
            if next.missing_fields(options.collect_email).is_empty() {
                action = Some(DialogueAction::RunFinalizer);
                (Finalize, Prompt::Finalizing)
            } else {
                (AwaitGuests, Prompt::AskGuests { dates: Some(*dates) })
            }
        }
        (AwaitDates, TurnEvent::DatesConflict(_)) => (AwaitDates, Prompt::DatesTaken),
        (AwaitDates, TurnEvent::InvalidDate) => (AwaitDates, Prompt::InvalidDates),
        (AwaitDates, TurnEvent::NotRecognized(_)) => (AwaitDates, Prompt::RetryDates),

        (AwaitGuests, TurnEvent::GuestsGiven(guests)) if *guests > 0 => {
            next.guests = Some(*guests);
            (AwaitName, Prompt::AskName { guests: Some(*guests) })
        }
        (AwaitGuests, TurnEvent::GuestsGiven(_) | TurnEvent::NotRecognized(_)) => {
            (AwaitGuests, Prompt::RetryGuests)
        }

        (AwaitName, TurnEvent::NameGiven(name)) => {
            next.name = Some(name.clone());
            (AwaitNameConfirm, Prompt::ConfirmName { name: name.clone() })
        }
        (AwaitName, TurnEvent::NotRecognized(_)) => (AwaitNameSpelled, Prompt::AskNameSpelled),

        (AwaitNameSpelled, TurnEvent::NameGiven(name)) => {
            next.name = Some(name.clone());
            (AwaitSpelledConfirm, Prompt::ConfirmSpelledName { name: name.clone() })
        }
        (AwaitNameSpelled, TurnEvent::NotRecognized(_)) => {
            (AwaitNameSpelled, Prompt::RetryNameSpelled)
        }

        (AwaitNameConfirm | AwaitSpelledConfirm, TurnEvent::Answer(YesNo::Yes)) => {
            if options.collect_email {
                (AwaitEmail, Prompt::AskEmail)
            } else {
                action = Some(DialogueAction::RunFinalizer);
                (Finalize, Prompt::Finalizing)
            }
        }
        (AwaitNameConfirm | AwaitSpelledConfirm, TurnEvent::Answer(YesNo::No)) => {
            next.name = None;
            (AwaitNameSpelled, Prompt::AskNameSpelled)
        }
        (
            AwaitNameConfirm | AwaitSpelledConfirm,
            TurnEvent::Answer(YesNo::Unrecognized) | TurnEvent::NotRecognized(_),
        ) => (
            current,
            Prompt::RepeatConfirmation { step: current, value: draft.name.clone().unwrap_or_default() },
        ),

        (AwaitEmail, TurnEvent::EmailGiven(email)) => {
            next.email = Some(email.address.clone());
            (AwaitEmailConfirm, Prompt::ConfirmEmail { address: email.address.clone() })
        }
        (AwaitEmail, TurnEvent::NotRecognized(_)) => (AwaitEmail, Prompt::RetryEmail),

        (AwaitEmailConfirm, TurnEvent::Answer(YesNo::Yes)) => {
            action = Some(DialogueAction::RunFinalizer);
            (Finalize, Prompt::Finalizing)
        }
        (AwaitEmailConfirm, TurnEvent::Answer(YesNo::No)) => {
            next.email = None;
            (AwaitEmail, Prompt::AskEmailSpelled)
        }
        (AwaitEmailConfirm, TurnEvent::Answer(YesNo::Unrecognized) | TurnEvent::NotRecognized(_)) => (
            AwaitEmailConfirm,
            Prompt::RepeatConfirmation {
                step: AwaitEmailConfirm,
                value: draft.email.clone().unwrap_or_default(),
            },
        ),

        (Finalize, TurnEvent::BookingCommitted) => {
            action = Some(DialogueAction::EndCall);
            match (draft.name.clone(), draft.guests, draft.dates) {
                (Some(name), Some(guests), Some(dates)) => {
                    (Finalize, Prompt::Booked { name, guests, dates })
                }
                _ => (Finalize, Prompt::Apology),
            }
        }
        (Finalize, TurnEvent::BookingConflict) => {
            next.dates = None;
            (AwaitDates, Prompt::DatesTaken)
        }

        (step, _) => (step, replay_prompt(step, draft)),
    };

    Transition { from: current, to, event, prompt, draft: next, action }
}
