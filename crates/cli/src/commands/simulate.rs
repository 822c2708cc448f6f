use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use stayline_core::audit::InMemoryAuditSink;
use stayline_core::calendar::NewCalendarEvent;
use stayline_core::config::{AppConfig, LoadOptions};
use stayline_core::{
    BookingFinalizer, CallId, Clock, DateInterval, DialogueService, DialogueStep,
    InMemoryCalendar, InMemorySessionStore, ManualClock, RecordingNotifier, SentMessage,
    SystemClock, TurnRequest,
};

use crate::commands::CommandResult;

pub const SIMULATED_CALL_ID: &str = "CA-simulated";
pub const SIMULATED_CALLER: &str = "+15555550100";

#[derive(Clone, Debug, Default)]
pub struct SimulateOptions {
    pub utterances: Vec<String>,
    pub today: Option<NaiveDate>,
    pub blocked: Vec<DateInterval>,
    pub collect_email: bool,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct TranscriptLine {
    speaker: &'static str,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<DialogueStep>,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    business_name: String,
    completed: bool,
    unused_utterances: usize,
    transcript: Vec<TranscriptLine>,
    inserted_events: Vec<NewCalendarEvent>,
    notifications: Vec<SentMessage>,
    audit_events: Vec<String>,
}

/// `2024-08-10..2024-08-12`, end exclusive.
pub fn parse_blocked_interval(value: &str) -> Result<DateInterval, String> {
    let (start, end) = value
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got `{value}`"))?;
    let start = start
        .trim()
        .parse::<NaiveDate>()
        .map_err(|error| format!("invalid start date `{start}`: {error}"))?;
    let end_exclusive =
        end.trim().parse::<NaiveDate>().map_err(|error| format!("invalid end date `{end}`: {error}"))?;
    if end_exclusive <= start {
        return Err(format!("`{value}` must end after it starts"));
    }
    Ok(DateInterval { start, end_exclusive })
}

pub fn run(options: SimulateOptions) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("simulate", "config_validation", error.to_string(), 2),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "simulate",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let report = runtime.block_on(simulate(&config, &options));
    let output = if options.json {
        serde_json::to_string_pretty(&report)
            .unwrap_or_else(|error| format!("simulation report serialization failed: {error}"))
    } else {
        render_human(&report)
    };

    CommandResult { exit_code: 0, output }
}

async fn simulate(config: &AppConfig, options: &SimulateOptions) -> SimulationReport {
    let mut settings = config.dialogue.settings();
    settings.collect_email = settings.collect_email || options.collect_email;

    let clock: Arc<dyn Clock> = match options.today {
        Some(today) => {
            let noon = today.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN));
            let now = settings
                .time_zone
                .from_local_datetime(&noon)
                .earliest()
                .map(|local| local.with_timezone(&Utc))
                .unwrap_or_else(|| noon.and_utc());
            Arc::new(ManualClock::new(now))
        }
        None => Arc::new(SystemClock),
    };

    let calendar = Arc::new(InMemoryCalendar::default());
    for interval in &options.blocked {
        calendar.block("Existing booking", *interval).await;
    }
    let notifier = Arc::new(RecordingNotifier::default());
    let audit = Arc::new(InMemoryAuditSink::default());
    let finalizer = Arc::new(BookingFinalizer::new(
        calendar.clone(),
        notifier.clone(),
        audit.clone(),
        settings.business_name.clone(),
    ));
    let business_name = settings.business_name.clone();
    let service = DialogueService::new(
        Arc::new(InMemorySessionStore::new(clock.clone())),
        finalizer,
        clock,
        audit.clone(),
        settings,
    );

    let mut transcript = Vec::new();
    let mut completed = false;
    let mut consumed = 0;
    let turns = std::iter::once(None).chain(options.utterances.iter().map(Some));

    for (index, utterance) in turns.enumerate() {
        if let Some(text) = utterance {
            transcript.push(TranscriptLine { speaker: "caller", text: text.clone(), step: None });
            consumed += 1;
        }
        let response = service
            .handle_turn(TurnRequest {
                call_id: CallId(SIMULATED_CALL_ID.to_owned()),
                utterance: utterance.cloned(),
                caller: Some(SIMULATED_CALLER.to_owned()),
                correlation_id: format!("simulate-{index}"),
            })
            .await;
        transcript.push(TranscriptLine {
            speaker: "assistant",
            text: response.prompt,
            step: Some(response.step),
        });
        if !response.awaiting_input {
            completed = true;
            break;
        }
    }

    service.drain_notifications().await;

    SimulationReport {
        business_name,
        completed,
        unused_utterances: options.utterances.len() - consumed,
        transcript,
        inserted_events: calendar.inserted().await,
        notifications: notifier.sent().await,
        audit_events: audit.event_types(),
    }
}

fn render_human(report: &SimulationReport) -> String {
    let mut lines = vec![format!("simulated call to {}", report.business_name)];
    for line in &report.transcript {
        lines.push(format!("{:>9}: {}", line.speaker, line.text));
    }

    if !report.completed {
        lines.push("call still in progress after the last utterance".to_string());
    }
    if report.unused_utterances > 0 {
        lines.push(format!("{} utterance(s) left unused after hang-up", report.unused_utterances));
    }
    for event in &report.inserted_events {
        lines.push(format!(
            "calendar insert: {} [{} .. {})",
            event.summary, event.interval.start, event.interval.end_exclusive
        ));
    }
    for message in &report.notifications {
        match message {
            SentMessage::Sms { to, body } => lines.push(format!("sms to {to}: {body}")),
            SentMessage::Email { to, subject, .. } => {
                lines.push(format!("email to {to}: {subject}"))
            }
        }
    }

    lines.join("\n")
}
