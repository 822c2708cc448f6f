use serde::{Deserialize, Serialize};

use crate::domain::booking::{BookingDraft, BookingField, StayDates};
use crate::speech::{SpokenEmail, YesNo};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogueStep {
    AwaitDates,
    AwaitGuests,
    AwaitName,
    AwaitNameConfirm,
    AwaitNameSpelled,
    AwaitSpelledConfirm,
    AwaitEmail,
    AwaitEmailConfirm,
    Finalize,
}

impl DialogueStep {
    /// The field a free-form utterance is parsed as in this step.
    pub fn expected_field(&self) -> BookingField {
        match self {
            Self::AwaitDates => BookingField::Dates,
            Self::AwaitGuests => BookingField::Guests,
            Self::AwaitName | Self::AwaitNameSpelled => BookingField::Name,
            Self::AwaitEmail => BookingField::Email,
            Self::AwaitNameConfirm
            | Self::AwaitSpelledConfirm
            | Self::AwaitEmailConfirm
            | Self::Finalize => BookingField::Answer,
        }
    }
}

/// What the caller's turn (or the finalizer) amounted to, after parsing and any
/// availability lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnEvent {
    CallStarted,
    Silence,
    DatesAvailable(StayDates),
    DatesConflict(StayDates),
    InvalidDate,
    GuestsGiven(u32),
    NameGiven(String),
    EmailGiven(SpokenEmail),
    Answer(YesNo),
    NotRecognized(BookingField),
    BookingCommitted,
    BookingConflict,
    BackendFailed,
}

impl TurnEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CallStarted => "call_started",
            Self::Silence => "silence",
            Self::DatesAvailable(_) => "dates_available",
            Self::DatesConflict(_) => "dates_conflict",
            Self::InvalidDate => "invalid_date",
            Self::GuestsGiven(_) => "guests_given",
            Self::NameGiven(_) => "name_given",
            Self::EmailGiven(_) => "email_given",
            Self::Answer(_) => "answer",
            Self::NotRecognized(_) => "not_recognized",
            Self::BookingCommitted => "booking_committed",
            Self::BookingConflict => "booking_conflict",
            Self::BackendFailed => "backend_failed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Prompt {
    Greeting,
    AskDates,
    RetryDates,
    InvalidDates,
    DatesTaken,
    AskGuests { dates: Option<StayDates> },
    RetryGuests,
    AskName { guests: Option<u32> },
    ConfirmName { name: String },
    AskNameSpelled,
    RetryNameSpelled,
    ConfirmSpelledName { name: String },
    AskEmail,
    RetryEmail,
    ConfirmEmail { address: String },
    AskEmailSpelled,
    RepeatConfirmation { step: DialogueStep, value: String },
    Finalizing,
    Booked { name: String, guests: u32, dates: StayDates },
    Apology,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueAction {
    /// Commit the draft through the finalizer and feed its outcome back in.
    RunFinalizer,
    EndCall,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: DialogueStep,
    pub to: DialogueStep,
    pub event: TurnEvent,
    pub prompt: Prompt,
    pub draft: BookingDraft,
    pub action: Option<DialogueAction>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueOptions {
    pub collect_email: bool,
}
