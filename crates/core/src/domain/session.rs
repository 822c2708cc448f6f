use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::dialogue::states::DialogueStep;
use crate::domain::booking::BookingDraft;

/// Telephony call identifier (Twilio `CallSid`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallId(pub String);

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub call_id: CallId,
    pub step: DialogueStep,
    pub draft: BookingDraft,
    pub caller: Option<String>,
    pub turns: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        call_id: CallId,
        caller: Option<String>,
        now: DateTime<Utc>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            call_id,
            step: DialogueStep::AwaitDates,
            draft: BookingDraft::default(),
            caller: caller.filter(|value| !value.trim().is_empty()),
            turns: 0,
            created_at: now,
            expires_at: now + idle_timeout,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>, idle_timeout: Duration) {
        self.turns = self.turns.saturating_add(1);
        self.expires_at = now + idle_timeout;
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
