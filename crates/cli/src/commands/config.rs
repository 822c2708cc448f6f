use std::env;
use std::fs;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use stayline_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let server = &config.server;
    let dialogue = &config.dialogue;
    let calendar = &config.calendar;
    let notifications = &config.notifications;

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    let mut push = |key: &str, value: String, env_keys: &[&str]| {
        lines.push(render_line(key, &value, source(key, env_keys)));
    };

    push("server.bind_address", server.bind_address.clone(), &["STAYLINE_SERVER_BIND_ADDRESS"]);
    push("server.port", server.port.to_string(), &["STAYLINE_SERVER_PORT", "PORT"]);
    push(
        "server.graceful_shutdown_secs",
        server.graceful_shutdown_secs.to_string(),
        &["STAYLINE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
    );
    push(
        "dialogue.business_name",
        dialogue.business_name.clone(),
        &["STAYLINE_DIALOGUE_BUSINESS_NAME"],
    );
    push(
        "dialogue.time_zone",
        dialogue.time_zone.name().to_string(),
        &["STAYLINE_DIALOGUE_TIME_ZONE"],
    );
    push(
        "dialogue.session_idle_timeout_secs",
        dialogue.session_idle_timeout_secs.to_string(),
        &["STAYLINE_DIALOGUE_SESSION_IDLE_TIMEOUT_SECS"],
    );
    push(
        "dialogue.sweep_interval_secs",
        dialogue.sweep_interval_secs.to_string(),
        &["STAYLINE_DIALOGUE_SWEEP_INTERVAL_SECS"],
    );
    push(
        "dialogue.collect_email",
        dialogue.collect_email.to_string(),
        &["STAYLINE_DIALOGUE_COLLECT_EMAIL"],
    );
    push("dialogue.voice", dialogue.voice.clone(), &["STAYLINE_DIALOGUE_VOICE"]);
    push("dialogue.language", dialogue.language.clone(), &["STAYLINE_DIALOGUE_LANGUAGE"]);
    push("calendar.provider", format!("{:?}", calendar.provider), &["STAYLINE_CALENDAR_PROVIDER"]);
    push(
        "calendar.calendar_id",
        unset_or(calendar.calendar_id.as_deref()),
        &["STAYLINE_CALENDAR_ID"],
    );
    push(
        "calendar.access_token",
        redact(calendar.access_token.as_ref()),
        &["STAYLINE_CALENDAR_ACCESS_TOKEN"],
    );
    push(
        "calendar.api_base_url",
        calendar.api_base_url.clone(),
        &["STAYLINE_CALENDAR_API_BASE_URL"],
    );
    push(
        "calendar.timeout_secs",
        calendar.timeout_secs.to_string(),
        &["STAYLINE_CALENDAR_TIMEOUT_SECS"],
    );
    push(
        "notifications.sms_enabled",
        notifications.sms_enabled.to_string(),
        &["STAYLINE_NOTIFICATIONS_SMS_ENABLED"],
    );
    push(
        "notifications.email_enabled",
        notifications.email_enabled.to_string(),
        &["STAYLINE_NOTIFICATIONS_EMAIL_ENABLED"],
    );
    push(
        "notifications.twilio_account_sid",
        unset_or(notifications.twilio_account_sid.as_deref()),
        &["STAYLINE_TWILIO_ACCOUNT_SID"],
    );
    push(
        "notifications.twilio_auth_token",
        redact(notifications.twilio_auth_token.as_ref()),
        &["STAYLINE_TWILIO_AUTH_TOKEN"],
    );
    push(
        "notifications.twilio_from_number",
        unset_or(notifications.twilio_from_number.as_deref()),
        &["STAYLINE_TWILIO_FROM_NUMBER"],
    );
    push(
        "notifications.sendgrid_api_key",
        redact(notifications.sendgrid_api_key.as_ref()),
        &["STAYLINE_SENDGRID_API_KEY"],
    );
    push(
        "notifications.sendgrid_from_email",
        unset_or(notifications.sendgrid_from_email.as_deref()),
        &["STAYLINE_SENDGRID_FROM_EMAIL"],
    );
    push(
        "notifications.timeout_secs",
        notifications.timeout_secs.to_string(),
        &["STAYLINE_NOTIFICATIONS_TIMEOUT_SECS"],
    );
    push(
        "logging.level",
        config.logging.level.clone(),
        &["STAYLINE_LOGGING_LEVEL", "STAYLINE_LOG_LEVEL"],
    );
    push(
        "logging.format",
        format!("{:?}", config.logging.format),
        &["STAYLINE_LOGGING_FORMAT", "STAYLINE_LOG_FORMAT"],
    );

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

pub fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

pub fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn unset_or(value: Option<&str>) -> String {
    value.unwrap_or("<unset>").to_string()
}

/// Keeps a short uppercase key prefix such as `SG.` and hides the rest.
pub fn redact(secret: Option<&SecretString>) -> String {
    let Some(secret) = secret else {
        return "<unset>".to_string();
    };
    let trimmed = secret.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('.') {
        if prefix.len() <= 3 && prefix.chars().all(|ch| ch.is_ascii_uppercase()) {
            return format!("{prefix}.***");
        }
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use secrecy::SecretString;

    use super::{field_source, redact, render_line};

    fn secret(value: &str) -> SecretString {
        value.to_owned().into()
    }

    #[test]
    fn redaction_never_reveals_secret_bodies() {
        assert_eq!(redact(None), "<unset>");
        assert_eq!(redact(Some(&secret("SG.abcdef.ghijk"))), "SG.***");
        assert_eq!(redact(Some(&secret("ya29.a0AfH6"))), "<redacted>");
        assert_eq!(redact(Some(&secret("plain-token"))), "<redacted>");
        assert_eq!(redact(Some(&secret("   "))), "<empty>");
    }

    #[test]
    fn file_values_are_attributed_to_the_file() {
        let doc = "[dialogue]\nbusiness_name = \"Lakeside\"\n".parse::<toml::Value>().expect("toml");

        let source = field_source(
            "dialogue.business_name",
            &["STAYLINE_TEST_UNSET_KEY"],
            Some(&doc),
            Some(Path::new("stayline.toml")),
        );
        assert_eq!(source, "file (stayline.toml)");

        let missing =
            field_source("dialogue.voice", &["STAYLINE_TEST_UNSET_KEY"], Some(&doc), None);
        assert_eq!(missing, "default");
    }

    #[test]
    fn lines_show_key_value_and_source() {
        assert_eq!(
            render_line("server.port", "3000", "default".to_string()),
            "- server.port = 3000 (source: default)"
        );
    }
}
