use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use stayline_core::audit::TracingAuditSink;
use stayline_core::calendar::{CalendarError, CalendarStore, InMemoryCalendar};
use stayline_core::config::{AppConfig, CalendarProvider, ConfigError, LoadOptions};
use stayline_core::notify::NotifyError;
use stayline_core::{BookingFinalizer, DialogueService, InMemorySessionStore, SystemClock};
use thiserror::Error;
use tracing::info;

use crate::channels::ChannelNotifier;
use crate::google::GoogleCalendar;
use crate::health::{self, HealthState};
use crate::twiml::TwimlRenderer;
use crate::voice::{self, VoiceState, VOICE_PATH};

pub struct Application {
    pub config: AppConfig,
    pub dialogue: Arc<DialogueService>,
    pub twiml: Arc<TwimlRenderer>,
}

impl Application {
    /// Voice webhook and health check on one listener.
    pub fn router(&self) -> Router {
        voice::router(VoiceState { dialogue: self.dialogue.clone(), twiml: self.twiml.clone() })
            .merge(health::router(HealthState { dialogue: self.dialogue.clone() }))
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("calendar client setup failed: {0}")]
    Calendar(#[source] CalendarError),
    #[error("notification client setup failed: {0}")]
    Notifications(#[source] NotifyError),
    #[error("twiml templates failed to load: {0}")]
    Templates(#[source] tera::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate()?;

    let calendar = build_calendar(&config)?;
    info!(
        event_name = "system.bootstrap.calendar_ready",
        correlation_id = "bootstrap",
        provider = calendar.provider(),
        "calendar store configured"
    );

    let notifier =
        ChannelNotifier::from_config(&config.notifications).map_err(BootstrapError::Notifications)?;
    info!(
        event_name = "system.bootstrap.notifications_ready",
        correlation_id = "bootstrap",
        channels = ?notifier.channels(),
        "notification channels configured"
    );

    let clock = Arc::new(SystemClock);
    let audit_sink = Arc::new(TracingAuditSink);
    let finalizer = Arc::new(BookingFinalizer::new(
        calendar,
        Arc::new(notifier),
        audit_sink.clone(),
        config.dialogue.business_name.clone(),
    ));
    let dialogue = DialogueService::new(
        Arc::new(InMemorySessionStore::new(clock.clone())),
        finalizer,
        clock,
        audit_sink,
        config.dialogue.settings(),
    );

    let twiml = TwimlRenderer::new(
        config.dialogue.voice.clone(),
        config.dialogue.language.clone(),
        VOICE_PATH,
    )
    .map_err(BootstrapError::Templates)?;

    Ok(Application { config, dialogue: Arc::new(dialogue), twiml: Arc::new(twiml) })
}

fn build_calendar(config: &AppConfig) -> Result<Arc<dyn CalendarStore>, BootstrapError> {
    match config.calendar.provider {
        CalendarProvider::Memory => Ok(Arc::new(InMemoryCalendar::default())),
        CalendarProvider::Google => {
            let (Some(calendar_id), Some(access_token)) =
                (&config.calendar.calendar_id, &config.calendar.access_token)
            else {
                return Err(BootstrapError::Config(ConfigError::Validation(
                    "calendar.calendar_id and calendar.access_token are required for google"
                        .to_owned(),
                )));
            };
            let google = GoogleCalendar::new(
                &config.calendar.api_base_url,
                calendar_id,
                access_token.clone(),
                config.dialogue.time_zone,
                Duration::from_secs(config.calendar.timeout_secs),
            )
            .map_err(BootstrapError::Calendar)?;
            Ok(Arc::new(google))
        }
    }
}
