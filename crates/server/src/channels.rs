use async_trait::async_trait;
use stayline_core::config::NotificationsConfig;
use stayline_core::notify::{Notifier, NotifyError};
use std::time::Duration;
use tracing::debug;

use crate::sendgrid::SendGridEmail;
use crate::twilio::TwilioSms;

/// Routes each notification to its configured provider. An unconfigured channel is skipped
/// rather than failing the booking.
#[derive(Default)]
pub struct ChannelNotifier {
    sms: Option<TwilioSms>,
    email: Option<SendGridEmail>,
}

impl ChannelNotifier {
    pub fn new(sms: Option<TwilioSms>, email: Option<SendGridEmail>) -> Self {
        Self { sms, email }
    }

    /// Builds the enabled channels. Config validation has already checked that enabled
    /// channels carry credentials.
    pub fn from_config(config: &NotificationsConfig) -> Result<Self, NotifyError> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let sms = match (
            config.sms_enabled,
            &config.twilio_account_sid,
            &config.twilio_auth_token,
            &config.twilio_from_number,
        ) {
            (true, Some(sid), Some(token), Some(from)) => Some(TwilioSms::new(
                &config.twilio_api_base_url,
                sid.clone(),
                token.clone(),
                from.clone(),
                timeout,
            )?),
            _ => None,
        };

        let email = match (config.email_enabled, &config.sendgrid_api_key, &config.sendgrid_from_email) {
            (true, Some(key), Some(from)) => Some(SendGridEmail::new(
                &config.sendgrid_api_base_url,
                key.clone(),
                from.clone(),
                timeout,
            )?),
            _ => None,
        };

        Ok(Self::new(sms, email))
    }

    pub fn channels(&self) -> Vec<&'static str> {
        let mut channels = Vec::new();
        if self.sms.is_some() {
            channels.push("sms");
        }
        if self.email.is_some() {
            channels.push("email");
        }
        channels
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn send_sms(&self, to: &str, body: &str) -> Result<(), NotifyError> {
        match &self.sms {
            Some(sms) => sms.send(to, body).await,
            None => {
                debug!(event_name = "notification.sms_skipped", "sms channel disabled");
                Ok(())
            }
        }
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        match &self.email {
            Some(email) => email.send(to, subject, body).await,
            None => {
                debug!(event_name = "notification.email_skipped", "email channel disabled");
                Ok(())
            }
        }
    }
}
