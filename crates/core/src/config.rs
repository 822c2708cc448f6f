use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use chrono_tz::Tz;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dialogue::service::DialogueSettings;

pub const DEFAULT_CONFIG_FILE: &str = "stayline.toml";
pub const NESTED_CONFIG_FILE: &str = "config/stayline.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub dialogue: DialogueConfig,
    pub calendar: CalendarConfig,
    pub notifications: NotificationsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct DialogueConfig {
    pub business_name: String,
    pub time_zone: Tz,
    pub session_idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
    pub collect_email: bool,
    pub voice: String,
    pub language: String,
}

#[derive(Clone, Debug)]
pub struct CalendarConfig {
    pub provider: CalendarProvider,
    pub calendar_id: Option<String>,
    pub access_token: Option<SecretString>,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct NotificationsConfig {
    pub sms_enabled: bool,
    pub email_enabled: bool,
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<SecretString>,
    pub twilio_from_number: Option<String>,
    pub twilio_api_base_url: String,
    pub sendgrid_api_key: Option<SecretString>,
    pub sendgrid_from_email: Option<String>,
    pub sendgrid_api_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarProvider {
    Google,
    Memory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub business_name: Option<String>,
    pub collect_email: Option<bool>,
    pub calendar_provider: Option<CalendarProvider>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3000,
                graceful_shutdown_secs: 15,
            },
            dialogue: DialogueConfig {
                business_name: "Stayline Vacation Rentals".to_string(),
                time_zone: chrono_tz::America::Chicago,
                session_idle_timeout_secs: 30 * 60,
                sweep_interval_secs: 60,
                collect_email: false,
                voice: "alice".to_string(),
                language: "en-US".to_string(),
            },
            calendar: CalendarConfig {
                provider: CalendarProvider::Memory,
                calendar_id: None,
                access_token: None,
                api_base_url: "https://www.googleapis.com/calendar/v3".to_string(),
                timeout_secs: 10,
            },
            notifications: NotificationsConfig {
                sms_enabled: false,
                email_enabled: false,
                twilio_account_sid: None,
                twilio_auth_token: None,
                twilio_from_number: None,
                twilio_api_base_url: "https://api.twilio.com".to_string(),
                sendgrid_api_key: None,
                sendgrid_from_email: None,
                sendgrid_api_base_url: "https://api.sendgrid.com".to_string(),
                timeout_secs: 10,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for CalendarProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Validation(format!(
                "unsupported calendar provider `{other}` (expected google|memory)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl DialogueConfig {
    pub fn settings(&self) -> DialogueSettings {
        DialogueSettings {
            business_name: self.business_name.clone(),
            time_zone: self.time_zone,
            idle_timeout: Duration::seconds(self.session_idle_timeout_secs as i64),
            collect_email: self.collect_email,
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(dialogue) = patch.dialogue {
            if let Some(business_name) = dialogue.business_name {
                self.dialogue.business_name = business_name;
            }
            if let Some(time_zone) = dialogue.time_zone {
                self.dialogue.time_zone = parse_time_zone("dialogue.time_zone", &time_zone)?;
            }
            if let Some(timeout) = dialogue.session_idle_timeout_secs {
                self.dialogue.session_idle_timeout_secs = timeout;
            }
            if let Some(interval) = dialogue.sweep_interval_secs {
                self.dialogue.sweep_interval_secs = interval;
            }
            if let Some(collect_email) = dialogue.collect_email {
                self.dialogue.collect_email = collect_email;
            }
            if let Some(voice) = dialogue.voice {
                self.dialogue.voice = voice;
            }
            if let Some(language) = dialogue.language {
                self.dialogue.language = language;
            }
        }

        if let Some(calendar) = patch.calendar {
            if let Some(provider) = calendar.provider {
                self.calendar.provider = provider;
            }
            if let Some(calendar_id) = calendar.calendar_id {
                self.calendar.calendar_id = Some(calendar_id);
            }
            if let Some(calendar_access_token_value) = calendar.access_token {
                self.calendar.access_token = Some(secret_value(calendar_access_token_value));
            }
            if let Some(api_base_url) = calendar.api_base_url {
                self.calendar.api_base_url = api_base_url;
            }
            if let Some(timeout_secs) = calendar.timeout_secs {
                self.calendar.timeout_secs = timeout_secs;
            }
        }

        if let Some(notifications) = patch.notifications {
            let target = &mut self.notifications;
            if let Some(sms_enabled) = notifications.sms_enabled {
                target.sms_enabled = sms_enabled;
            }
            if let Some(email_enabled) = notifications.email_enabled {
                target.email_enabled = email_enabled;
            }
            if let Some(account_sid) = notifications.twilio_account_sid {
                target.twilio_account_sid = Some(account_sid);
            }
            if let Some(twilio_auth_token_value) = notifications.twilio_auth_token {
                target.twilio_auth_token = Some(secret_value(twilio_auth_token_value));
            }
            if let Some(from_number) = notifications.twilio_from_number {
                target.twilio_from_number = Some(from_number);
            }
            if let Some(base_url) = notifications.twilio_api_base_url {
                target.twilio_api_base_url = base_url;
            }
            if let Some(sendgrid_api_key_value) = notifications.sendgrid_api_key {
                target.sendgrid_api_key = Some(secret_value(sendgrid_api_key_value));
            }
            if let Some(from_email) = notifications.sendgrid_from_email {
                target.sendgrid_from_email = Some(from_email);
            }
            if let Some(base_url) = notifications.sendgrid_api_base_url {
                target.sendgrid_api_base_url = base_url;
            }
            if let Some(timeout_secs) = notifications.timeout_secs {
                target.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("STAYLINE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        // Hosting platforms commonly inject a bare PORT.
        let port = read_env("STAYLINE_SERVER_PORT")
            .map(|value| ("STAYLINE_SERVER_PORT", value))
            .or_else(|| read_env("PORT").map(|value| ("PORT", value)));
        if let Some((key, value)) = port {
            self.server.port = parse_u16(key, &value)?;
        }
        if let Some(value) = read_env("STAYLINE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("STAYLINE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("STAYLINE_DIALOGUE_BUSINESS_NAME") {
            self.dialogue.business_name = value;
        }
        if let Some(value) = read_env("STAYLINE_DIALOGUE_TIME_ZONE") {
            self.dialogue.time_zone = parse_time_zone("STAYLINE_DIALOGUE_TIME_ZONE", &value)?;
        }
        if let Some(value) = read_env("STAYLINE_DIALOGUE_SESSION_IDLE_TIMEOUT_SECS") {
            self.dialogue.session_idle_timeout_secs =
                parse_u64("STAYLINE_DIALOGUE_SESSION_IDLE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("STAYLINE_DIALOGUE_SWEEP_INTERVAL_SECS") {
            self.dialogue.sweep_interval_secs =
                parse_u64("STAYLINE_DIALOGUE_SWEEP_INTERVAL_SECS", &value)?;
        }
        if let Some(value) = read_env("STAYLINE_DIALOGUE_COLLECT_EMAIL") {
            self.dialogue.collect_email = parse_bool("STAYLINE_DIALOGUE_COLLECT_EMAIL", &value)?;
        }
        if let Some(value) = read_env("STAYLINE_DIALOGUE_VOICE") {
            self.dialogue.voice = value;
        }
        if let Some(value) = read_env("STAYLINE_DIALOGUE_LANGUAGE") {
            self.dialogue.language = value;
        }

        if let Some(value) = read_env("STAYLINE_CALENDAR_PROVIDER") {
            self.calendar.provider = value.parse()?;
        }
        if let Some(value) = read_env("STAYLINE_CALENDAR_ID") {
            self.calendar.calendar_id = Some(value);
        }
        if let Some(value) = read_env("STAYLINE_CALENDAR_ACCESS_TOKEN") {
            self.calendar.access_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("STAYLINE_CALENDAR_API_BASE_URL") {
            self.calendar.api_base_url = value;
        }
        if let Some(value) = read_env("STAYLINE_CALENDAR_TIMEOUT_SECS") {
            self.calendar.timeout_secs = parse_u64("STAYLINE_CALENDAR_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("STAYLINE_NOTIFICATIONS_SMS_ENABLED") {
            self.notifications.sms_enabled =
                parse_bool("STAYLINE_NOTIFICATIONS_SMS_ENABLED", &value)?;
        }
        if let Some(value) = read_env("STAYLINE_NOTIFICATIONS_EMAIL_ENABLED") {
            self.notifications.email_enabled =
                parse_bool("STAYLINE_NOTIFICATIONS_EMAIL_ENABLED", &value)?;
        }
        if let Some(value) = read_env("STAYLINE_TWILIO_ACCOUNT_SID") {
            self.notifications.twilio_account_sid = Some(value);
        }
        if let Some(value) = read_env("STAYLINE_TWILIO_AUTH_TOKEN") {
            self.notifications.twilio_auth_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("STAYLINE_TWILIO_FROM_NUMBER") {
            self.notifications.twilio_from_number = Some(value);
        }
        if let Some(value) = read_env("STAYLINE_TWILIO_API_BASE_URL") {
            self.notifications.twilio_api_base_url = value;
        }
        if let Some(value) = read_env("STAYLINE_SENDGRID_API_KEY") {
            self.notifications.sendgrid_api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("STAYLINE_SENDGRID_FROM_EMAIL") {
            self.notifications.sendgrid_from_email = Some(value);
        }
        if let Some(value) = read_env("STAYLINE_SENDGRID_API_BASE_URL") {
            self.notifications.sendgrid_api_base_url = value;
        }
        if let Some(value) = read_env("STAYLINE_NOTIFICATIONS_TIMEOUT_SECS") {
            self.notifications.timeout_secs =
                parse_u64("STAYLINE_NOTIFICATIONS_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("STAYLINE_LOGGING_LEVEL").or_else(|| read_env("STAYLINE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("STAYLINE_LOGGING_FORMAT").or_else(|| read_env("STAYLINE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(business_name) = overrides.business_name {
            self.dialogue.business_name = business_name;
        }
        if let Some(collect_email) = overrides.collect_email {
            self.dialogue.collect_email = collect_email;
        }
        if let Some(provider) = overrides.calendar_provider {
            self.calendar.provider = provider;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_dialogue(&self.dialogue)?;
        validate_calendar(&self.calendar)?;
        validate_notifications(&self.notifications, self.dialogue.collect_email)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_dialogue(dialogue: &DialogueConfig) -> Result<(), ConfigError> {
    if dialogue.business_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "dialogue.business_name is required; it is spoken in the greeting".to_string(),
        ));
    }

    if dialogue.session_idle_timeout_secs < 60 || dialogue.session_idle_timeout_secs > 24 * 3600 {
        return Err(ConfigError::Validation(
            "dialogue.session_idle_timeout_secs must be in range 60..=86400".to_string(),
        ));
    }

    if dialogue.sweep_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "dialogue.sweep_interval_secs must be greater than zero".to_string(),
        ));
    }

    if dialogue.voice.trim().is_empty() {
        return Err(ConfigError::Validation(
            "dialogue.voice must name a text-to-speech voice (for example `alice`)".to_string(),
        ));
    }

    Ok(())
}

fn validate_calendar(calendar: &CalendarConfig) -> Result<(), ConfigError> {
    if calendar.timeout_secs == 0 || calendar.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "calendar.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    if calendar.provider == CalendarProvider::Memory {
        return Ok(());
    }

    let calendar_id_missing =
        calendar.calendar_id.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
    if calendar_id_missing {
        return Err(ConfigError::Validation(
            "calendar.calendar_id is required for the google provider. Find it under Google Calendar > Settings > Integrate calendar > Calendar ID".to_string(),
        ));
    }

    if secret_missing(calendar.access_token.as_ref()) {
        return Err(ConfigError::Validation(
            "calendar.access_token is required for the google provider (OAuth bearer token with the calendar.events scope)".to_string(),
        ));
    }

    validate_url("calendar.api_base_url", &calendar.api_base_url)
}

fn validate_notifications(
    notifications: &NotificationsConfig,
    collect_email: bool,
) -> Result<(), ConfigError> {
    if notifications.timeout_secs == 0 || notifications.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "notifications.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    if notifications.sms_enabled {
        let sid = notifications.twilio_account_sid.as_deref().unwrap_or_default().trim();
        if sid.is_empty() {
            return Err(ConfigError::Validation(
                "notifications.twilio_account_sid is required when sms is enabled. Find it on the Twilio console dashboard".to_string(),
            ));
        }
        if !sid.starts_with("AC") {
            return Err(ConfigError::Validation(
                "notifications.twilio_account_sid must start with `AC`".to_string(),
            ));
        }
        if secret_missing(notifications.twilio_auth_token.as_ref()) {
            return Err(ConfigError::Validation(
                "notifications.twilio_auth_token is required when sms is enabled".to_string(),
            ));
        }
        let from = notifications.twilio_from_number.as_deref().unwrap_or_default().trim();
        if !from.starts_with('+') {
            return Err(ConfigError::Validation(
                "notifications.twilio_from_number must be an E.164 number such as +15125550100"
                    .to_string(),
            ));
        }
        validate_url("notifications.twilio_api_base_url", &notifications.twilio_api_base_url)?;
    }

    if notifications.email_enabled {
        if !collect_email {
            return Err(ConfigError::Validation(
                "notifications.email_enabled requires dialogue.collect_email so there is an address to send to".to_string(),
            ));
        }
        if secret_missing(notifications.sendgrid_api_key.as_ref()) {
            return Err(ConfigError::Validation(
                "notifications.sendgrid_api_key is required when email is enabled".to_string(),
            ));
        }
        let from = notifications.sendgrid_from_email.as_deref().unwrap_or_default();
        if !from.contains('@') {
            return Err(ConfigError::Validation(
                "notifications.sendgrid_from_email must be a verified sender address".to_string(),
            ));
        }
        validate_url("notifications.sendgrid_api_base_url", &notifications.sendgrid_api_base_url)?;
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{key} must start with http:// or https://")))
    }
}

fn secret_missing(secret: Option<&SecretString>) -> bool {
    secret.map(|value| value.expose_secret().trim().is_empty()).unwrap_or(true)
}

fn parse_time_zone(key: &str, value: &str) -> Result<Tz, ConfigError> {
    value.trim().parse::<Tz>().map_err(|_| {
        ConfigError::Validation(format!(
            "{key} must be an IANA time zone such as America/Chicago, got `{value}`"
        ))
    })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    dialogue: Option<DialoguePatch>,
    calendar: Option<CalendarPatch>,
    notifications: Option<NotificationsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DialoguePatch {
    business_name: Option<String>,
    time_zone: Option<String>,
    session_idle_timeout_secs: Option<u64>,
    sweep_interval_secs: Option<u64>,
    collect_email: Option<bool>,
    voice: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CalendarPatch {
    provider: Option<CalendarProvider>,
    calendar_id: Option<String>,
    access_token: Option<String>,
    api_base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationsPatch {
    sms_enabled: Option<bool>,
    email_enabled: Option<bool>,
    twilio_account_sid: Option<String>,
    twilio_auth_token: Option<String>,
    twilio_from_number: Option<String>,
    twilio_api_base_url: Option<String>,
    sendgrid_api_key: Option<String>,
    sendgrid_from_email: Option<String>,
    sendgrid_api_base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
