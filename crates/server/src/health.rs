use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use stayline_core::DialogueService;

#[derive(Clone)]
pub struct HealthState {
    pub dialogue: Arc<DialogueService>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub sessions: HealthCheck,
    pub calendar_provider: &'static str,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let sessions = match state.dialogue.active_sessions().await {
        Ok(count) => HealthCheck { status: "ready", detail: format!("{count} active call sessions") },
        Err(error) => HealthCheck { status: "degraded", detail: error.to_string() },
    };
    let ready = sessions.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: format!("answering calls for {}", state.dialogue.settings().business_name),
        },
        sessions,
        calendar_provider: state.dialogue.calendar_provider(),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{extract::State, http::StatusCode, Json};
    use stayline_core::audit::InMemoryAuditSink;
    use stayline_core::{
        BookingFinalizer, CallId, DialogueService, DialogueSettings, InMemoryCalendar,
        InMemorySessionStore, NoopNotifier, Session, SessionStore, SessionStoreError, SystemClock,
    };

    use crate::health::{health, HealthState};

    fn dialogue(sessions: Arc<dyn SessionStore>) -> Arc<DialogueService> {
        let audit = Arc::new(InMemoryAuditSink::default());
        let finalizer = Arc::new(BookingFinalizer::new(
            Arc::new(InMemoryCalendar::default()),
            Arc::new(NoopNotifier),
            audit.clone(),
            "Lakeside Cabins",
        ));
        Arc::new(DialogueService::new(
            sessions,
            finalizer,
            Arc::new(SystemClock),
            audit,
            DialogueSettings::default(),
        ))
    }

    struct BrokenStore;

    #[async_trait]
    impl SessionStore for BrokenStore {
        async fn get(&self, _call_id: &CallId) -> Result<Option<Session>, SessionStoreError> {
            Err(SessionStoreError::Unavailable("offline".to_owned()))
        }
        async fn put(&self, _session: Session) -> Result<(), SessionStoreError> {
            Err(SessionStoreError::Unavailable("offline".to_owned()))
        }
        async fn delete(&self, _call_id: &CallId) -> Result<bool, SessionStoreError> {
            Err(SessionStoreError::Unavailable("offline".to_owned()))
        }
        async fn sweep_expired(&self) -> Result<usize, SessionStoreError> {
            Err(SessionStoreError::Unavailable("offline".to_owned()))
        }
        async fn active_count(&self) -> Result<usize, SessionStoreError> {
            Err(SessionStoreError::Unavailable("offline".to_owned()))
        }
    }

    #[tokio::test]
    async fn health_reports_sessions_and_calendar_provider() {
        let store = Arc::new(InMemorySessionStore::new(Arc::new(SystemClock)));

        let (status, Json(payload)) = health(State(HealthState { dialogue: dialogue(store) })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.sessions.detail, "0 active call sessions");
        assert_eq!(payload.calendar_provider, "memory");
    }

    #[tokio::test]
    async fn health_is_degraded_when_session_store_fails() {
        let (status, Json(payload)) =
            health(State(HealthState { dialogue: dialogue(Arc::new(BrokenStore)) })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
