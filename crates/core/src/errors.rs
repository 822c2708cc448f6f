use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::booking::BookingField;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("check-in {check_in} is after check-out {check_out}")]
    InvertedStay { check_in: NaiveDate, check_out: NaiveDate },
    #[error("guest count must be greater than zero")]
    NoGuests,
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// Outcomes a single turn can run into. Everything except `Backend` is recoverable by
/// asking the caller again.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("no {field} recognized in utterance")]
    ParseFailure { field: BookingField },
    #[error("`{month_day}` is not a real calendar date")]
    InvalidDate { month_day: String },
    #[error("requested stay {check_in}..{check_out} overlaps an existing booking")]
    DatesUnavailable { check_in: NaiveDate, check_out: NaiveDate },
    #[error("backend failure: {0}")]
    Backend(String),
}

impl BookingError {
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Backend(_))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("session store failure: {0}")]
    SessionStore(String),
}

impl ApplicationError {
    /// Sentence read to the caller when a turn cannot continue.
    pub fn spoken_message(&self) -> &'static str {
        match self {
            Self::Booking(BookingError::ParseFailure { .. }) => {
                "Sorry, I didn't catch that. Could you say it again?"
            }
            Self::Booking(BookingError::InvalidDate { .. }) => {
                "That doesn't look like a real calendar date. What dates would you like to stay?"
            }
            Self::Booking(BookingError::DatesUnavailable { .. }) => {
                "Those dates are already booked. Are there other dates that would work for you?"
            }
            Self::Booking(BookingError::Backend(_)) => {
                "I'm sorry, there was an issue saving your booking. Please call back and try again."
            }
            Self::Domain(_) | Self::SessionStore(_) => {
                "I'm sorry, something went wrong on our end. Please call back in a few minutes."
            }
        }
    }
}
