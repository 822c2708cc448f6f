use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("{channel} delivery is not configured")]
    Disabled { channel: &'static str },
    #[error("notification transport failed: {0}")]
    Transport(String),
    #[error("notification provider rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Outbound guest notifications. Callers treat every failure as best effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_sms(&self, to: &str, body: &str) -> Result<(), NotifyError>;
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send_sms(&self, to: &str, _body: &str) -> Result<(), NotifyError> {
        debug!(event_name = "notify.sms.skipped", to = %to, "sms delivery disabled");
        Ok(())
    }

    async fn send_email(&self, to: &str, _subject: &str, _body: &str) -> Result<(), NotifyError> {
        debug!(event_name = "notify.email.skipped", to = %to, "email delivery disabled");
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentMessage {
    Sms { to: String, body: String },
    Email { to: String, subject: String, body: String },
}

/// Keeps every message in memory; used by the simulator and tests.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: RwLock<Vec<SentMessage>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self { failing: AtomicBool::new(true), ..Self::default() }
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().await.clone()
    }

    fn check(&self) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Transport("recording notifier set to fail".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_sms(&self, to: &str, body: &str) -> Result<(), NotifyError> {
        self.check()?;
        self.sent.write().await.push(SentMessage::Sms { to: to.to_owned(), body: body.to_owned() });
        Ok(())
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.check()?;
        self.sent.write().await.push(SentMessage::Email {
            to: to.to_owned(),
            subject: subject.to_owned(),
            body: body.to_owned(),
        });
        Ok(())
    }
}
