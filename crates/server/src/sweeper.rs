use std::sync::Arc;
use std::time::Duration;

use stayline_core::DialogueService;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Reclaims sessions for callers who hung up mid-dialogue.
pub fn spawn(dialogue: Arc<DialogueService>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep_once(&dialogue).await;
        }
    })
}

pub async fn sweep_once(dialogue: &DialogueService) -> usize {
    match dialogue.sweep_expired().await {
        Ok(removed) => {
            if removed > 0 {
                debug!(
                    event_name = "dialogue.sessions_swept",
                    correlation_id = "sweeper",
                    removed,
                    "expired call sessions removed"
                );
            }
            removed
        }
        Err(error) => {
            warn!(
                event_name = "dialogue.sweep_failed",
                correlation_id = "sweeper",
                error = %error,
                "session sweep failed"
            );
            0
        }
    }
}
