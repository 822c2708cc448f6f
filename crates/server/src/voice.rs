use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Router};
use serde::Deserialize;
use stayline_core::{CallId, DialogueService, TurnRequest};
use tracing::{error, info};
use uuid::Uuid;

use crate::twiml::{TwimlRenderer, FALLBACK_TWIML};

pub const VOICE_PATH: &str = "/voice";

#[derive(Clone)]
pub struct VoiceState {
    pub dialogue: Arc<DialogueService>,
    pub twiml: Arc<TwimlRenderer>,
}

/// Subset of the Twilio voice webhook form this service reads.
#[derive(Debug, Deserialize)]
pub struct VoiceWebhook {
    #[serde(rename = "CallSid")]
    pub call_sid: String,
    #[serde(rename = "SpeechResult", default)]
    pub speech_result: Option<String>,
    #[serde(rename = "From", default)]
    pub from: Option<String>,
}

pub fn router(state: VoiceState) -> Router {
    Router::new().route(VOICE_PATH, post(voice)).with_state(state)
}

pub async fn voice(State(state): State<VoiceState>, Form(webhook): Form<VoiceWebhook>) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    info!(
        event_name = "voice.webhook_received",
        correlation_id = %correlation_id,
        call_id = %webhook.call_sid,
        has_speech = webhook.speech_result.is_some(),
        "voice webhook received"
    );

    let turn = state
        .dialogue
        .handle_turn(TurnRequest {
            call_id: CallId(webhook.call_sid.clone()),
            utterance: webhook.speech_result,
            caller: webhook.from.filter(|from| !from.trim().is_empty()),
            correlation_id: correlation_id.clone(),
        })
        .await;

    let rendered = if turn.awaiting_input {
        state.twiml.gather(&turn.prompt)
    } else {
        state.twiml.hangup(&turn.prompt)
    };

    let body = rendered.unwrap_or_else(|render_error| {
        error!(
            event_name = "voice.twiml_render_failed",
            correlation_id = %correlation_id,
            call_id = %webhook.call_sid,
            error = %render_error,
            "falling back to static twiml"
        );
        FALLBACK_TWIML.to_owned()
    });

    (StatusCode::OK, [(header::CONTENT_TYPE, "text/xml")], body).into_response()
}
