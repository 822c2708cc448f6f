use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingField {
    Dates,
    Guests,
    Name,
    Email,
    Answer,
}

impl fmt::Display for BookingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Dates => "date range",
            Self::Guests => "guest count",
            Self::Name => "name",
            Self::Email => "email address",
            Self::Answer => "yes or no answer",
        };
        f.write_str(label)
    }
}

/// Check-in and check-out days of a stay. The check-out day itself is never occupied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayDates {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayDates {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, DomainError> {
        if check_in > check_out {
            return Err(DomainError::InvertedStay { check_in, check_out });
        }
        Ok(Self { check_in, check_out })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Occupied nights as a half-open interval. A same-day request books one night.
    pub fn occupied(&self) -> DateInterval {
        let end_exclusive = if self.check_out > self.check_in {
            self.check_out
        } else {
            self.check_in + Duration::days(1)
        };
        DateInterval { start: self.check_in, end_exclusive }
    }
}

/// Half-open day interval `[start, end_exclusive)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInterval {
    pub start: NaiveDate,
    pub end_exclusive: NaiveDate,
}

impl DateInterval {
    pub fn overlaps(&self, other: &DateInterval) -> bool {
        self.start < other.end_exclusive && self.end_exclusive > other.start
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub dates: Option<StayDates>,
    pub guests: Option<u32>,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl BookingDraft {
    pub fn missing_fields(&self, collect_email: bool) -> Vec<BookingField> {
        let mut missing = Vec::new();
        if self.dates.is_none() {
            missing.push(BookingField::Dates);
        }
        if self.guests.is_none() {
            missing.push(BookingField::Guests);
        }
        if self.name.as_deref().map(str::trim).unwrap_or_default().is_empty() {
            missing.push(BookingField::Name);
        }
        if collect_email && self.email.is_none() {
            missing.push(BookingField::Email);
        }
        missing
    }

    pub fn to_record(&self, phone: Option<&str>) -> Result<BookingRecord, DomainError> {
        let (Some(dates), Some(guests), Some(name)) = (self.dates, self.guests, &self.name) else {
            return Err(DomainError::InvariantViolation(format!(
                "booking is missing {:?}",
                self.missing_fields(false)
            )));
        };
        if guests == 0 {
            return Err(DomainError::NoGuests);
        }

        Ok(BookingRecord {
            name: name.clone(),
            guests,
            dates,
            phone: phone.map(str::to_owned).filter(|value| !value.trim().is_empty()),
            email: self.email.clone(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub name: String,
    pub guests: u32,
    pub dates: StayDates,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl BookingRecord {
    pub fn summary(&self) -> String {
        format!("Booking for {} - {} guests", self.name, self.guests)
    }
}
