use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use stayline_core::notify::NotifyError;
use tracing::debug;

/// Twilio Programmable Messaging client for booking confirmation texts.
pub struct TwilioSms {
    client: Client,
    messages_url: String,
    account_sid: String,
    auth_token: SecretString,
    from_number: String,
}

impl TwilioSms {
    pub fn new(
        api_base_url: &str,
        account_sid: impl Into<String>,
        auth_token: SecretString,
        from_number: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| NotifyError::Transport(error.to_string()))?;
        let account_sid = account_sid.into();
        let messages_url = format!(
            "{}/2010-04-01/Accounts/{account_sid}/Messages.json",
            api_base_url.trim_end_matches('/')
        );
        Ok(Self { client, messages_url, account_sid, auth_token, from_number: from_number.into() })
    }

    pub async fn send(&self, to: &str, body: &str) -> Result<(), NotifyError> {
        let params = [("To", to), ("From", self.from_number.as_str()), ("Body", body)];

        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&params)
            .send()
            .await
            .map_err(|error| NotifyError::Transport(error.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, message });
        }

        debug!(event_name = "notification.twilio.accepted", "twilio accepted message");
        Ok(())
    }
}
