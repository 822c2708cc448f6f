use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use stayline_core::notify::NotifyError;

pub struct SendGridEmail {
    client: Client,
    send_url: String,
    api_key: SecretString,
    from_email: String,
}

impl SendGridEmail {
    pub fn new(
        api_base_url: &str,
        api_key: SecretString,
        from_email: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| NotifyError::Transport(error.to_string()))?;
        let send_url = format!("{}/v3/mail/send", api_base_url.trim_end_matches('/'));
        Ok(Self { client, send_url, api_key, from_email: from_email.into() })
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let payload = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.from_email },
            "subject": subject,
            "content": [{ "type": "text/plain", "value": body }],
        });

        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|error| NotifyError::Transport(error.to_string()))?;

        // SendGrid answers 202 Accepted with an empty body.
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, message });
        }
        Ok(())
    }
}
