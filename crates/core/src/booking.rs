//! Commits a confirmed booking to the calendar and tells the guest about it.
//!
//! The availability check and the insert are two separate calendar calls with no lock in
//! between; two callers racing for the same nights can both succeed. Guest notifications run
//! on their own task once the insert lands, so the caller's turn never waits on SMS or email.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::calendar::{CalendarEvent, CalendarStore, NewCalendarEvent};
use crate::dialogue::prompts::{guests_phrase, speak_booked_stay};
use crate::domain::booking::{BookingRecord, StayDates};
use crate::errors::BookingError;
use crate::notify::Notifier;

pub struct BookingFinalizer {
    calendar: Arc<dyn CalendarStore>,
    notifier: Arc<dyn Notifier>,
    audit_sink: Arc<dyn AuditSink>,
    business_name: String,
    deliveries: Mutex<Vec<JoinHandle<()>>>,
}

impl BookingFinalizer {
    pub fn new(
        calendar: Arc<dyn CalendarStore>,
        notifier: Arc<dyn Notifier>,
        audit_sink: Arc<dyn AuditSink>,
        business_name: impl Into<String>,
    ) -> Self {
        Self {
            calendar,
            notifier,
            audit_sink,
            business_name: business_name.into(),
            deliveries: Mutex::new(Vec::new()),
        }
    }

    pub fn calendar_provider(&self) -> &'static str {
        self.calendar.provider()
    }

    /// Fails with `DatesUnavailable` when any calendar event overlaps the occupied nights.
    pub async fn check_availability(
        &self,
        dates: &StayDates,
        audit: &AuditContext,
    ) -> Result<(), BookingError> {
        let requested = dates.occupied();
        let existing = self.calendar.list_events(requested).await.map_err(|error| {
            self.audit_sink.emit(
                AuditEvent::new(
                    audit,
                    "calendar.lookup_failed",
                    AuditCategory::Calendar,
                    AuditOutcome::Failed,
                )
                .with_metadata("error", error.to_string()),
            );
            BookingError::Backend(error.to_string())
        })?;

        if let Some(conflict) = existing.iter().find(|event| event.interval.overlaps(&requested)) {
            info!(
                event_name = "calendar.conflict_detected",
                correlation_id = %audit.correlation_id,
                conflicting_event = %conflict.id,
                check_in = %dates.check_in(),
                check_out = %dates.check_out(),
                "requested stay overlaps an existing booking"
            );
            self.audit_sink.emit(
                AuditEvent::new(
                    audit,
                    "calendar.conflict_detected",
                    AuditCategory::Calendar,
                    AuditOutcome::Rejected,
                )
                .with_metadata("conflicting_event", conflict.id.clone()),
            );
            return Err(BookingError::DatesUnavailable {
                check_in: dates.check_in(),
                check_out: dates.check_out(),
            });
        }

        Ok(())
    }

    /// Re-checks availability and inserts one all-day event. Best-effort notifications are
    /// started in the background afterwards; their failures never undo the insert.
    pub async fn finalize(
        &self,
        record: &BookingRecord,
        audit: &AuditContext,
    ) -> Result<CalendarEvent, BookingError> {
        self.check_availability(&record.dates, audit).await?;

        let created = self
            .calendar
            .insert_event(NewCalendarEvent {
                summary: record.summary(),
                description: self.event_description(record),
                interval: record.dates.occupied(),
            })
            .await
            .map_err(|error| {
                self.audit_sink.emit(
                    AuditEvent::new(
                        audit,
                        "calendar.insert_failed",
                        AuditCategory::Calendar,
                        AuditOutcome::Failed,
                    )
                    .with_metadata("error", error.to_string()),
                );
                BookingError::Backend(error.to_string())
            })?;

        info!(
            event_name = "calendar.booking_inserted",
            correlation_id = %audit.correlation_id,
            event_id = %created.id,
            guests = record.guests,
            "booking committed to calendar"
        );
        self.audit_sink.emit(
            AuditEvent::new(
                audit,
                "calendar.booking_inserted",
                AuditCategory::Calendar,
                AuditOutcome::Success,
            )
            .with_metadata("event_id", created.id.clone())
            .with_metadata("check_in", record.dates.check_in().to_string())
            .with_metadata("check_out", record.dates.occupied().end_exclusive.to_string()),
        );

        self.dispatch_notifications(record, audit);
        Ok(created)
    }

    /// Waits for every notification started so far. Used at shutdown and by the simulator.
    pub async fn drain_notifications(&self) {
        let pending = match self.deliveries.lock() {
            Ok(mut deliveries) => std::mem::take(&mut *deliveries),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for handle in pending {
            if let Err(error) = handle.await {
                warn!(
                    event_name = "notify.task_failed",
                    correlation_id = "notifications",
                    error = %error,
                    "guest notification task did not finish"
                );
            }
        }
    }

    pub fn sms_body(&self, record: &BookingRecord) -> String {
        format!(
            "Thanks, {}. Your stay at {} is booked {} for {}.",
            record.name,
            self.business_name,
            speak_booked_stay(&record.dates),
            guests_phrase(record.guests)
        )
    }

    fn event_description(&self, record: &BookingRecord) -> String {
        let mut description = format!(
            "{} booking for {} ({}) taken by the phone assistant.",
            self.business_name,
            record.name,
            guests_phrase(record.guests)
        );
        if let Some(phone) = &record.phone {
            description.push_str(&format!("\nPhone: {phone}"));
        }
        if let Some(email) = &record.email {
            description.push_str(&format!("\nEmail: {email}"));
        }
        description
    }

    fn dispatch_notifications(&self, record: &BookingRecord, audit: &AuditContext) {
        if record.phone.is_none() && record.email.is_none() {
            return;
        }

        let delivery = GuestNotification {
            notifier: self.notifier.clone(),
            audit_sink: self.audit_sink.clone(),
            audit: audit.clone(),
            phone: record.phone.clone(),
            email: record.email.clone(),
            subject: format!("Your booking at {}", self.business_name),
            body: self.sms_body(record),
        };
        let handle = tokio::spawn(delivery.send());

        let mut deliveries = match self.deliveries.lock() {
            Ok(deliveries) => deliveries,
            Err(poisoned) => poisoned.into_inner(),
        };
        deliveries.retain(|pending| !pending.is_finished());
        deliveries.push(handle);
    }
}

/// Everything one background delivery needs, owned so it can outlive the turn.
struct GuestNotification {
    notifier: Arc<dyn Notifier>,
    audit_sink: Arc<dyn AuditSink>,
    audit: AuditContext,
    phone: Option<String>,
    email: Option<String>,
    subject: String,
    body: String,
}

impl GuestNotification {
    async fn send(self) {
        if let Some(phone) = &self.phone {
            let outcome = self.notifier.send_sms(phone, &self.body).await;
            self.record_delivery("sms", outcome.err().map(|error| error.to_string()));
        }

        if let Some(email) = &self.email {
            let outcome = self.notifier.send_email(email, &self.subject, &self.body).await;
            self.record_delivery("email", outcome.err().map(|error| error.to_string()));
        }
    }

    fn record_delivery(&self, channel: &str, error: Option<String>) {
        let audit = &self.audit;
        match error {
            None => {
                info!(
                    event_name = "notify.delivered",
                    correlation_id = %audit.correlation_id,
                    channel,
                    "guest notification sent"
                );
                self.audit_sink.emit(AuditEvent::new(
                    audit,
                    format!("notification.{channel}_sent"),
                    AuditCategory::Notification,
                    AuditOutcome::Success,
                ));
            }
            Some(error) => {
                warn!(
                    event_name = "notify.failed",
                    correlation_id = %audit.correlation_id,
                    channel,
                    error = %error,
                    "guest notification failed; booking kept"
                );
                self.audit_sink.emit(
                    AuditEvent::new(
                        audit,
                        format!("notification.{channel}_failed"),
                        AuditCategory::Notification,
                        AuditOutcome::Failed,
                    )
                    .with_metadata("error", error),
                );
            }
        }
    }
}
