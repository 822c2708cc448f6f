use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use tokio::sync::Notify;

use stayline_core::audit::InMemoryAuditSink;
use stayline_core::{
    BookingFinalizer, CalendarError, CalendarEvent, CalendarStore, CallId, DateInterval,
    DialogueService, DialogueSettings, DialogueStep, InMemoryCalendar, InMemorySessionStore,
    ManualClock, NewCalendarEvent, Notifier, NotifyError, RecordingNotifier, SentMessage,
    SessionStore, TurnRequest, TurnResponse,
};

fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).expect("valid date")
}

struct Call {
    service: DialogueService,
    sessions: Arc<InMemorySessionStore>,
    notifier: Arc<RecordingNotifier>,
    audit: Arc<InMemoryAuditSink>,
}

fn call_with(calendar: Arc<dyn CalendarStore>) -> Call {
    let notifier = Arc::new(RecordingNotifier::default());
    let (service, sessions, audit) = service_with(calendar, notifier.clone());
    Call { service, sessions, notifier, audit }
}

fn service_with(
    calendar: Arc<dyn CalendarStore>,
    notifier: Arc<dyn Notifier>,
) -> (DialogueService, Arc<InMemorySessionStore>, Arc<InMemoryAuditSink>) {
    // Noon in Chicago on 2024-06-01.
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 17, 0, 0).unwrap()));
    let sessions = Arc::new(InMemorySessionStore::new(clock.clone()));
    let audit = Arc::new(InMemoryAuditSink::default());
    let finalizer =
        Arc::new(BookingFinalizer::new(calendar, notifier, audit.clone(), "Lakeside Cabins"));
    let service = DialogueService::new(
        sessions.clone(),
        finalizer,
        clock,
        audit.clone(),
        DialogueSettings::default(),
    );
    (service, sessions, audit)
}

async fn say(call: &Call, utterance: &str) -> TurnResponse {
    turn(&call.service, utterance).await
}

async fn turn(service: &DialogueService, utterance: &str) -> TurnResponse {
    service
        .handle_turn(TurnRequest {
            call_id: CallId("CA-e2e".to_owned()),
            utterance: Some(utterance.to_owned()),
            caller: Some("+15125550100".to_owned()),
            correlation_id: "req-e2e".to_owned(),
        })
        .await
}

#[tokio::test]
async fn scripted_call_books_exactly_one_stay() {
    let calendar = Arc::new(InMemoryCalendar::default());
    let call = call_with(calendar.clone());

    let greeting = say(&call, "").await;
    assert!(greeting.prompt.starts_with("Hello, welcome to Lakeside Cabins."));
    assert_eq!(greeting.step, DialogueStep::AwaitDates);

    let dates = say(&call, "august 10th through the 12th").await;
    assert_eq!(dates.step, DialogueStep::AwaitGuests);
    assert_eq!(dates.prompt, "Great, August 10 to August 12 is open. How many guests will be staying?");

    let guests = say(&call, "two guests").await;
    assert_eq!(guests.step, DialogueStep::AwaitName);

    let name = say(&call, "bee cee").await;
    assert_eq!(name.step, DialogueStep::AwaitNameConfirm);
    assert_eq!(name.prompt, "I have Bc, spelled B, C. Is that correct?");

    let done = say(&call, "yes").await;
    assert_eq!(done.step, DialogueStep::Finalize);
    assert!(!done.awaiting_input);
    assert_eq!(
        done.prompt,
        "Thank you, Bc. Your reservation for 2 guests from August 10 to August 12 is confirmed. Goodbye!"
    );

    let inserted = calendar.inserted().await;
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].summary, "Booking for Bc - 2 guests");
    assert_eq!(inserted[0].interval, DateInterval { start: day(8, 10), end_exclusive: day(8, 12) });

    call.service.drain_notifications().await;
    assert_eq!(
        call.notifier.sent().await,
        vec![SentMessage::Sms {
            to: "+15125550100".to_owned(),
            body: "Thanks, Bc. Your stay at Lakeside Cabins is booked from August 10 to August 12 for 2 guests."
                .to_owned(),
        }]
    );
    assert_eq!(call.sessions.active_count().await.expect("count"), 0);
    assert!(call.audit.event_types().contains(&"dialogue.session_closed".to_owned()));
}

#[tokio::test]
async fn single_day_call_confirms_the_night_it_books() {
    let calendar = Arc::new(InMemoryCalendar::default());
    let call = call_with(calendar.clone());

    for utterance in ["", "august 10th", "two", "bee cee"] {
        say(&call, utterance).await;
    }
    let done = say(&call, "yes").await;

    assert_eq!(
        done.prompt,
        "Thank you, Bc. Your reservation for 2 guests from August 10 to August 11 is confirmed. Goodbye!"
    );
    let inserted = calendar.inserted().await;
    assert_eq!(inserted[0].interval, DateInterval { start: day(8, 10), end_exclusive: day(8, 11) });

    call.service.drain_notifications().await;
    assert_eq!(
        call.notifier.sent().await,
        vec![SentMessage::Sms {
            to: "+15125550100".to_owned(),
            body: "Thanks, Bc. Your stay at Lakeside Cabins is booked from August 10 to August 11 for 2 guests."
                .to_owned(),
        }]
    );
}

#[tokio::test]
async fn backwards_range_is_not_stretched_into_next_year() {
    let calendar = Arc::new(InMemoryCalendar::default());
    let call = call_with(calendar.clone());

    say(&call, "").await;
    let backwards = say(&call, "august 12 to august 10").await;

    assert_eq!(backwards.step, DialogueStep::AwaitDates);
    assert!(backwards.prompt.starts_with("That doesn't look like a real calendar date."));
    assert!(calendar.inserted().await.is_empty());
}

/// Never delivers until released, like a provider that is hanging.
#[derive(Default)]
struct StalledNotifier {
    release: Notify,
}

#[async_trait]
impl Notifier for StalledNotifier {
    async fn send_sms(&self, _to: &str, _body: &str) -> Result<(), NotifyError> {
        self.release.notified().await;
        Ok(())
    }

    async fn send_email(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), NotifyError> {
        self.release.notified().await;
        Ok(())
    }
}

#[tokio::test]
async fn confirmation_is_spoken_without_waiting_for_notifications() {
    let calendar = Arc::new(InMemoryCalendar::default());
    let notifier = Arc::new(StalledNotifier::default());
    let (service, _sessions, audit) = service_with(calendar.clone(), notifier.clone());

    for utterance in ["", "august 10th through the 12th", "two", "bee cee"] {
        turn(&service, utterance).await;
    }
    let done = tokio::time::timeout(Duration::from_secs(5), turn(&service, "yes"))
        .await
        .expect("final turn must not wait on the stalled notifier");

    assert!(done.prompt.contains("is confirmed"));
    assert_eq!(calendar.inserted().await.len(), 1);

    notifier.release.notify_one();
    service.drain_notifications().await;
    assert!(audit.event_types().contains(&"notification.sms_sent".to_owned()));
}

#[tokio::test]
async fn conflicting_dates_keep_asking_and_never_insert() {
    let calendar = Arc::new(InMemoryCalendar::default());
    calendar
        .block("Booking for Someone - 4 guests", DateInterval { start: day(8, 9), end_exclusive: day(8, 11) })
        .await;
    let call = call_with(calendar.clone());

    say(&call, "").await;
    let taken = say(&call, "august 10th through the 12th").await;

    assert_eq!(taken.step, DialogueStep::AwaitDates);
    assert!(taken.awaiting_input);
    assert_eq!(
        taken.prompt,
        "I'm sorry, those dates are already booked. Are there other dates that would work for you?"
    );
    assert!(calendar.inserted().await.is_empty());

    let alternate = say(&call, "august 12th to the 14th").await;
    assert_eq!(alternate.step, DialogueStep::AwaitGuests);
}

#[tokio::test]
async fn rejected_name_goes_through_spelling() {
    let calendar = Arc::new(InMemoryCalendar::default());
    let call = call_with(calendar.clone());

    for utterance in ["", "september 1st to the 3rd", "4"] {
        say(&call, utterance).await;
    }
    let unsure = say(&call, "um I'm not sure").await;
    assert_eq!(unsure.step, DialogueStep::AwaitNameSpelled);

    let spelled = say(&call, "c a double r i g a n").await;
    assert_eq!(spelled.step, DialogueStep::AwaitSpelledConfirm);
    assert_eq!(spelled.prompt, "Thank you. I have C, A, R, R, I, G, A, N. Is that correct?");

    let unclear = say(&call, "hmm").await;
    assert_eq!(unclear.step, DialogueStep::AwaitSpelledConfirm);

    let done = say(&call, "yes that's right").await;
    assert!(!done.awaiting_input);
    assert_eq!(calendar.inserted().await[0].summary, "Booking for Carrigan - 4 guests");
}

/// Reports a conflict only on the second lookup: the first booking attempt passes the eager
/// check and then loses at commit time.
#[derive(Default)]
struct RacingCalendar {
    lookups: AtomicUsize,
    inserts: AtomicUsize,
}

#[async_trait]
impl CalendarStore for RacingCalendar {
    fn provider(&self) -> &'static str {
        "racing"
    }

    async fn list_events(&self, window: DateInterval) -> Result<Vec<CalendarEvent>, CalendarError> {
        if self.lookups.fetch_add(1, Ordering::SeqCst) != 1 {
            return Ok(Vec::new());
        }
        Ok(vec![CalendarEvent {
            id: "evt-other-caller".to_owned(),
            summary: "Booking for Other - 2 guests".to_owned(),
            interval: window,
        }])
    }

    async fn insert_event(&self, event: NewCalendarEvent) -> Result<CalendarEvent, CalendarError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(CalendarEvent { id: "evt".to_owned(), summary: event.summary, interval: event.interval })
    }
}

#[tokio::test]
async fn losing_the_race_at_finalize_returns_to_dates() {
    let calendar = Arc::new(RacingCalendar::default());
    let call = call_with(calendar.clone());

    for utterance in ["", "august 10th through the 12th", "two guests", "bee cee"] {
        say(&call, utterance).await;
    }
    let lost = say(&call, "yes").await;

    assert_eq!(lost.step, DialogueStep::AwaitDates);
    assert!(lost.awaiting_input);
    assert!(lost.prompt.contains("already booked"));
    assert_eq!(calendar.inserts.load(Ordering::SeqCst), 0);

    let session = call
        .sessions
        .get(&CallId("CA-e2e".to_owned()))
        .await
        .expect("store")
        .expect("session kept");
    assert!(session.draft.dates.is_none());
    assert_eq!(session.draft.guests, Some(2));
    assert_eq!(session.draft.name.as_deref(), Some("Bc"));

    let rebooked = say(&call, "august 14th to the 16th").await;
    assert!(!rebooked.awaiting_input);
    assert_eq!(
        rebooked.prompt,
        "Thank you, Bc. Your reservation for 2 guests from August 14 to August 16 is confirmed. Goodbye!"
    );
    assert_eq!(calendar.inserts.load(Ordering::SeqCst), 1);
}
