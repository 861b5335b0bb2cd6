//! REST endpoints for the two assistants.
//!
//! Each assistant holds at most one live engine per service instance, behind
//! an async mutex: turns for the same assistant are strictly serialized, so
//! a second submission waits for the in-flight one. Callers include the
//! session id they are talking to; a turn aimed at a session that has since
//! been replaced is refused rather than applied.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::context::SessionContext;
use super::engine::{Engine, EngineDeps};
use super::flow::{Flow, PosterFlow, QualifyFlow};
use super::session::Session;
use crate::error::EngineError;

/// Shared state for assistant routes.
#[derive(Clone)]
pub struct AssistState {
    pub deps: EngineDeps,
    pub qualify: Arc<Mutex<Option<Engine<QualifyFlow>>>>,
    pub poster: Arc<Mutex<Option<Engine<PosterFlow>>>>,
}

#[derive(Debug, Deserialize)]
struct StartBody {
    context: SessionContext,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TurnBody {
    #[serde(default)]
    session_id: Option<Uuid>,
    text: String,
}

/// Build the assistant REST routes.
pub fn assist_routes(deps: EngineDeps) -> Router {
    let state = AssistState {
        deps,
        qualify: Arc::new(Mutex::new(None)),
        poster: Arc::new(Mutex::new(None)),
    };

    Router::new()
        .route("/health", get(health))
        .route("/api/assist/qualify", get(get_qualify))
        .route("/api/assist/qualify/start", post(start_qualify))
        .route("/api/assist/qualify/message", post(message_qualify))
        .route("/api/assist/qualify/reset", post(reset_qualify))
        .route("/api/assist/requirement", get(get_requirement))
        .route("/api/assist/requirement/start", post(start_requirement))
        .route("/api/assist/requirement/message", post(message_requirement))
        .route("/api/assist/requirement/reset", post(reset_requirement))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "lead-assist"
    }))
}

// ── Qualify assistant ───────────────────────────────────────────────────

/// POST /api/assist/qualify/start
///
/// Opens a session for the given context: resumes a stored one when it still
/// matches, otherwise starts fresh with a greeting.
async fn start_qualify(
    State(state): State<AssistState>,
    Json(body): Json<StartBody>,
) -> Response {
    start_session(&state.deps, &state.qualify, body.context).await
}

/// POST /api/assist/qualify/message
async fn message_qualify(
    State(state): State<AssistState>,
    Json(body): Json<TurnBody>,
) -> Response {
    submit_message(&state.qualify, body).await
}

/// POST /api/assist/qualify/reset
async fn reset_qualify(State(state): State<AssistState>) -> Response {
    reset_session(&state.qualify).await
}

/// GET /api/assist/qualify
async fn get_qualify(State(state): State<AssistState>) -> Response {
    current_session(&state.qualify).await
}

// ── Requirement poster assistant ────────────────────────────────────────

/// POST /api/assist/requirement/start
async fn start_requirement(
    State(state): State<AssistState>,
    Json(body): Json<StartBody>,
) -> Response {
    start_session(&state.deps, &state.poster, body.context).await
}

/// POST /api/assist/requirement/message
async fn message_requirement(
    State(state): State<AssistState>,
    Json(body): Json<TurnBody>,
) -> Response {
    submit_message(&state.poster, body).await
}

/// POST /api/assist/requirement/reset
async fn reset_requirement(State(state): State<AssistState>) -> Response {
    reset_session(&state.poster).await
}

/// GET /api/assist/requirement
async fn get_requirement(State(state): State<AssistState>) -> Response {
    current_session(&state.poster).await
}

// ── Shared handler cores ────────────────────────────────────────────────

async fn start_session<F: Flow>(
    deps: &EngineDeps,
    slot: &Mutex<Option<Engine<F>>>,
    context: SessionContext,
) -> Response {
    let engine = Engine::<F>::open(context, deps.clone()).await;
    let view = session_view(engine.session());
    *slot.lock().await = Some(engine);
    Json(view).into_response()
}

async fn submit_message<F: Flow>(slot: &Mutex<Option<Engine<F>>>, body: TurnBody) -> Response {
    // Held across the turn: submissions for this assistant queue here.
    let mut guard = slot.lock().await;
    let Some(engine) = guard.as_mut() else {
        return no_session();
    };

    if let Some(id) = body.session_id {
        if id != engine.session().id {
            return (
                StatusCode::CONFLICT,
                Json(serde_json::json!({
                    "error": "Session was replaced; reload it before sending"
                })),
            )
                .into_response();
        }
    }

    match engine.submit_turn(&body.text).await {
        Ok(outcome) => {
            let mut view = session_view(engine.session());
            if let Some(fields) = view.as_object_mut() {
                fields.insert(
                    "newMessages".into(),
                    serde_json::to_value(&outcome.new_messages).unwrap_or_default(),
                );
                if let Some(completion) = &outcome.completion {
                    fields.insert(
                        "completion".into(),
                        serde_json::to_value(completion).unwrap_or_default(),
                    );
                }
            }
            Json(view).into_response()
        }
        Err(EngineError::SessionComplete) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "error": "This conversation has already completed"
            })),
        )
            .into_response(),
        Err(e @ EngineError::DataIntegrity { .. }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn reset_session<F: Flow>(slot: &Mutex<Option<Engine<F>>>) -> Response {
    let mut guard = slot.lock().await;
    let Some(engine) = guard.as_mut() else {
        return no_session();
    };
    engine.reset().await;
    Json(session_view(engine.session())).into_response()
}

async fn current_session<F: Flow>(slot: &Mutex<Option<Engine<F>>>) -> Response {
    match slot.lock().await.as_ref() {
        Some(engine) => Json(session_view(engine.session())).into_response(),
        None => no_session(),
    }
}

fn no_session() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": "No active session; start one first"})),
    )
        .into_response()
}

fn session_view<F: Flow>(session: &Session<F>) -> serde_json::Value {
    serde_json::json!({
        "sessionId": session.id,
        "stage": session.stage,
        "messages": session.messages,
        "data": serde_json::to_value(&session.data).unwrap_or_default(),
        "completed": session.is_terminal(),
    })
}
