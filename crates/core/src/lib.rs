//! Phone booking assistant core: spoken-input parsers, the booking dialogue, and the
//! ports it talks to (sessions, calendar, notifications).

pub mod audit;
pub mod booking;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod dialogue;
pub mod domain;
pub mod errors;
pub mod notify;
pub mod sessions;
pub mod speech;

pub use booking::BookingFinalizer;
pub use calendar::{CalendarError, CalendarEvent, CalendarStore, InMemoryCalendar, NewCalendarEvent};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dialogue::{DialogueService, DialogueSettings, DialogueStep, TurnRequest, TurnResponse};
pub use domain::booking::{BookingDraft, BookingField, BookingRecord, DateInterval, StayDates};
pub use domain::session::{CallId, Session};
pub use errors::{ApplicationError, BookingError, DomainError};
pub use notify::{NoopNotifier, Notifier, NotifyError, RecordingNotifier, SentMessage};
pub use sessions::{InMemorySessionStore, SessionStore, SessionStoreError};
