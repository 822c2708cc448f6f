use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::booking::DateInterval;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub interval: DateInterval,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCalendarEvent {
    pub summary: String,
    pub description: String,
    pub interval: DateInterval,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("calendar backend unreachable: {0}")]
    Unavailable(String),
    #[error("calendar backend rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("calendar response could not be decoded: {0}")]
    Decode(String),
}

/// Day-granular view of a booking calendar. Intervals are half-open on both sides of the
/// port.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    fn provider(&self) -> &'static str;

    /// Events overlapping `window`.
    async fn list_events(&self, window: DateInterval) -> Result<Vec<CalendarEvent>, CalendarError>;

    async fn insert_event(&self, event: NewCalendarEvent) -> Result<CalendarEvent, CalendarError>;
}

/// Process-local calendar for development runs, the call simulator and tests.
#[derive(Default)]
pub struct InMemoryCalendar {
    events: RwLock<Vec<CalendarEvent>>,
    inserted: RwLock<Vec<NewCalendarEvent>>,
    unavailable: AtomicBool,
}

impl InMemoryCalendar {
    pub async fn block(&self, summary: impl Into<String>, interval: DateInterval) {
        let mut events = self.events.write().await;
        events.push(CalendarEvent { id: Uuid::new_v4().to_string(), summary: summary.into(), interval });
    }

    pub async fn events(&self) -> Vec<CalendarEvent> {
        self.events.read().await.clone()
    }

    /// Everything passed to `insert_event`, in call order.
    pub async fn inserted(&self) -> Vec<NewCalendarEvent> {
        self.inserted.read().await.clone()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), CalendarError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CalendarError::Unavailable("in-memory calendar switched off".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarStore for InMemoryCalendar {
    fn provider(&self) -> &'static str {
        "memory"
    }

    async fn list_events(&self, window: DateInterval) -> Result<Vec<CalendarEvent>, CalendarError> {
        self.check_available()?;
        let events = self.events.read().await;
        Ok(events.iter().filter(|event| event.interval.overlaps(&window)).cloned().collect())
    }

    async fn insert_event(&self, event: NewCalendarEvent) -> Result<CalendarEvent, CalendarError> {
        self.check_available()?;
        let stored = CalendarEvent {
            id: Uuid::new_v4().to_string(),
            summary: event.summary.clone(),
            interval: event.interval,
        };
        self.inserted.write().await.push(event);
        self.events.write().await.push(stored.clone());
        Ok(stored)
    }
}
