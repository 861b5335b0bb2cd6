//! Integration tests for the assistant REST API.
//!
//! Each test spins up two Axum servers on random ports: a scripted stand-in
//! for the interpretation service, and the real assistant API wired to it
//! over HTTP. Tests then drive the chat endpoints with reqwest.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::timeout;

use lead_assist::chat::{EngineDeps, assist_routes};
use lead_assist::config::InterpreterConfig;
use lead_assist::error::HandoffError;
use lead_assist::handoff::{Completion, CompletionSink};
use lead_assist::interpreter::HttpInterpreter;
use lead_assist::store::{MemoryStore, SessionStore};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

// ── Scripted interpretation service ──────────────────────────────────

/// One captured call to the stub service.
struct InterpretCall {
    authorization: Option<String>,
    body: Value,
}

/// Stand-in for the interpretation service: answers from a fixed script
/// and records every request it saw.
#[derive(Clone, Default)]
struct ScriptedService {
    replies: Arc<Mutex<VecDeque<(StatusCode, Value)>>>,
    calls: Arc<Mutex<Vec<InterpretCall>>>,
}

async fn interpret(
    State(service): State<ScriptedService>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    service
        .calls
        .lock()
        .await
        .push(InterpretCall { authorization, body });

    match service.replies.lock().await.pop_front() {
        Some((status, reply)) => (status, Json(reply)),
        // Script ran dry; hold the stage so assertions can see it.
        None => (
            StatusCode::OK,
            Json(json!({ "analysis": "", "isStageComplete": false })),
        ),
    }
}

/// Start the stub interpretation service on a random port.
async fn start_interpreter(script: Vec<(StatusCode, Value)>) -> (String, ScriptedService) {
    let service = ScriptedService {
        replies: Arc::new(Mutex::new(script.into())),
        calls: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/interpret", post(interpret))
        .with_state(service.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}"), service)
}

// ── Assistant API under test ─────────────────────────────────────────

/// Completion sink that records what it was handed.
#[derive(Default)]
struct RecordingSink {
    delivered: Mutex<Vec<Completion>>,
}

#[async_trait]
impl CompletionSink for RecordingSink {
    async fn deliver(&self, completion: &Completion) -> Result<(), HandoffError> {
        self.delivered.lock().await.push(completion.clone());
        Ok(())
    }
}

/// Start the real assistant API on a random port, wired to the given
/// interpretation service over HTTP.
async fn start_assist(
    interpreter_url: &str,
    api_key: Option<&str>,
) -> (String, Arc<RecordingSink>, Arc<MemoryStore>) {
    let config = InterpreterConfig {
        base_url: interpreter_url.to_string(),
        api_key: api_key.map(|k| SecretString::from(k.to_string())),
        timeout: Duration::from_secs(5),
    };
    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(RecordingSink::default());
    let deps = EngineDeps {
        interpreter: Arc::new(HttpInterpreter::new(&config).unwrap()),
        store: store.clone(),
        sink: sink.clone(),
    };

    let app = assist_routes(deps);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}"), sink, store)
}

// ── Request helpers ──────────────────────────────────────────────────

fn inquiry_context() -> Value {
    json!({
        "contact_name": "Dana Reyes",
        "contact_email": "dana@acme.example",
        "subject": {
            "kind": "service_inquiry",
            "service_id": "svc-301",
            "service_name": "Payroll Migration",
            "vendor_name": "Ledgerline",
        },
    })
}

fn post_context() -> Value {
    json!({
        "contact_name": "Priya Shah",
        "contact_email": "priya@northbeam.example",
        "subject": { "kind": "requirement_post" },
    })
}

/// Reply that closes the current stage and asks the given follow-up.
fn advance(analysis: &str, extracted: &str, question: &str) -> (StatusCode, Value) {
    (
        StatusCode::OK,
        json!({
            "analysis": analysis,
            "isStageComplete": true,
            "nextQuestion": question,
            "extractedData": extracted,
        }),
    )
}

/// Reply that holds the current stage and re-asks.
fn clarify(question: &str) -> (StatusCode, Value) {
    (
        StatusCode::OK,
        json!({
            "analysis": "",
            "isStageComplete": false,
            "nextQuestion": question,
        }),
    )
}

/// Poster-flow reply that fills BANT slots and advances.
fn bant_advance(analysis: &str, bant: Value, question: &str) -> (StatusCode, Value) {
    (
        StatusCode::OK,
        json!({
            "analysis": analysis,
            "isStageComplete": true,
            "nextQuestion": question,
            "extractedBantData": bant,
        }),
    )
}

async fn post_json(client: &reqwest::Client, url: String, body: Value) -> (u16, Value) {
    let resp = client.post(url).json(&body).send().await.unwrap();
    let status = resp.status().as_u16();
    let body: Value = resp.json().await.unwrap();
    (status, body)
}

async fn send_text(
    client: &reqwest::Client,
    base: &str,
    assistant: &str,
    text: &str,
) -> (u16, Value) {
    post_json(
        client,
        format!("{base}/api/assist/{assistant}/message"),
        json!({ "text": text }),
    )
    .await
}

// ── Lead qualification flow ──────────────────────────────────────────

#[tokio::test]
async fn qualify_flow_runs_to_completion() {
    timeout(TEST_TIMEOUT, async {
        let script = vec![
            advance("Noted: around $15k.", "$15,000", "Who signs off on this?"),
            advance("Got it, you have sign-off.", "Dana, VP Operations", "What problem are you solving?"),
            advance("That's a clear pain point.", "Manual payroll is error prone", "When would you start?"),
            advance("Thanks, that's everything I need. The vendor will be in touch.", "Next quarter", ""),
        ];
        let (svc_url, _service) = start_interpreter(script).await;
        let (base, sink, store) = start_assist(&svc_url, None).await;
        let client = reqwest::Client::new();

        // Start: one greeting message, first stage, not yet complete.
        let (status, view) = post_json(
            &client,
            format!("{base}/api/assist/qualify/start"),
            json!({ "context": inquiry_context() }),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(view["stage"], "BUDGET");
        assert_eq!(view["completed"], false);
        let messages = view["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0]["text"].as_str().unwrap().contains("Payroll Migration"));

        // Three ordinary turns, each advancing one stage.
        let (_, view) = send_text(&client, &base, "qualify", "somewhere around 15k I think").await;
        assert_eq!(view["stage"], "AUTHORITY");
        assert_eq!(view["data"]["BUDGET"], "$15,000");
        assert_eq!(view["newMessages"].as_array().unwrap().len(), 3);

        let (_, view) = send_text(&client, &base, "qualify", "that would be me").await;
        assert_eq!(view["stage"], "NEED");

        let (_, view) = send_text(&client, &base, "qualify", "payroll keeps going wrong").await;
        assert_eq!(view["stage"], "TIMELINE");

        // The final turn finishes the session and carries the completion.
        let (status, view) = send_text(&client, &base, "qualify", "next quarter").await;
        assert_eq!(status, 200);
        assert_eq!(view["stage"], "COMPLETED");
        assert_eq!(view["completed"], true);
        assert_eq!(view["completion"]["kind"], "lead");
        assert_eq!(view["completion"]["qualificationData"]["TIMELINE"], "Next quarter");
        assert_eq!(view["completion"]["context"]["contact_email"], "dana@acme.example");

        // Exactly one completion reached the sink.
        let delivered = sink.delivered.lock().await;
        assert_eq!(delivered.len(), 1);
        match &delivered[0] {
            Completion::Lead(lead) => {
                assert_eq!(lead.qualification_data.budget, "$15,000");
                assert_eq!(lead.context.contact_name, "Dana Reyes");
            }
            other => panic!("expected a lead, got {other:?}"),
        }
        drop(delivered);

        // The stored session is cleared once the completion is out.
        assert!(store.fetch("lead_qualification_session").await.unwrap().is_none());

        // Further messages are refused.
        let (status, body) = send_text(&client, &base, "qualify", "hello?").await;
        assert_eq!(status, 409);
        assert!(body["error"].as_str().unwrap().contains("already completed"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn interpret_requests_carry_stage_history_and_context() {
    timeout(TEST_TIMEOUT, async {
        let script = vec![
            advance("Noted.", "$5k", "Who decides?"),
            clarify("Could you say more about that?"),
        ];
        let (svc_url, service) = start_interpreter(script).await;
        let (base, _sink, _store) = start_assist(&svc_url, None).await;
        let client = reqwest::Client::new();

        post_json(
            &client,
            format!("{base}/api/assist/qualify/start"),
            json!({ "context": inquiry_context() }),
        )
        .await;
        send_text(&client, &base, "qualify", "about five thousand").await;
        send_text(&client, &base, "qualify", "not sure yet").await;

        let calls = service.calls.lock().await;
        assert_eq!(calls.len(), 2);

        let first = &calls[0].body;
        assert_eq!(first["type"], "qualify");
        assert_eq!(first["stage"], "BUDGET");
        assert_eq!(first["userInput"], "about five thousand");
        assert_eq!(first["context"]["contact_name"], "Dana Reyes");
        assert_eq!(first["context"]["subject"]["kind"], "service_inquiry");
        // History stops before the in-flight message: the greeting only.
        let history = first["history"].as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["sender"], "assistant");

        // Second turn: greeting, user turn, analysis, follow-up question.
        let second = &calls[1].body;
        assert_eq!(second["stage"], "AUTHORITY");
        assert_eq!(second["userInput"], "not sure yet");
        assert_eq!(second["history"].as_array().unwrap().len(), 4);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn api_key_rides_as_bearer_auth() {
    timeout(TEST_TIMEOUT, async {
        let (svc_url, service) = start_interpreter(vec![clarify("Say more?")]).await;
        let (base, _sink, _store) = start_assist(&svc_url, Some("test-key-123")).await;
        let client = reqwest::Client::new();

        post_json(
            &client,
            format!("{base}/api/assist/qualify/start"),
            json!({ "context": inquiry_context() }),
        )
        .await;
        send_text(&client, &base, "qualify", "hello").await;

        let calls = service.calls.lock().await;
        assert_eq!(calls[0].authorization.as_deref(), Some("Bearer test-key-123"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn service_error_becomes_an_apology_message() {
    timeout(TEST_TIMEOUT, async {
        let script = vec![
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "model overloaded" }),
            ),
            advance("Noted.", "$9k", "Who decides?"),
        ];
        let (svc_url, _service) = start_interpreter(script).await;
        let (base, _sink, _store) = start_assist(&svc_url, None).await;
        let client = reqwest::Client::new();

        post_json(
            &client,
            format!("{base}/api/assist/qualify/start"),
            json!({ "context": inquiry_context() }),
        )
        .await;

        // The failed turn still answers 200; the error lands in the chat.
        let (status, view) = send_text(&client, &base, "qualify", "nine thousand").await;
        assert_eq!(status, 200);
        assert_eq!(view["stage"], "BUDGET");
        assert_eq!(view["data"]["BUDGET"], "");
        let new_messages = view["newMessages"].as_array().unwrap();
        assert_eq!(new_messages.len(), 2);
        let apology = new_messages[1]["text"].as_str().unwrap();
        assert!(apology.contains("model overloaded"));
        assert!(apology.contains("(500)"));

        // The retry goes through normally.
        let (_, view) = send_text(&client, &base, "qualify", "nine thousand").await;
        assert_eq!(view["stage"], "AUTHORITY");
        assert_eq!(view["data"]["BUDGET"], "$9k");
    })
    .await
    .expect("test timed out");
}

// ── Requirement poster flow ──────────────────────────────────────────

#[tokio::test]
async fn requirement_flow_edits_in_review_then_posts() {
    timeout(TEST_TIMEOUT, async {
        let script = vec![
            (
                StatusCode::OK,
                json!({
                    "analysis": "Here's a first draft of your post.",
                    "isStageComplete": true,
                    "nextQuestion": "What budget range do you have in mind?",
                    "extractedTitle": "Payroll migration for 80 staff",
                    "extractedDescription": "Move an 80-person payroll onto a managed platform before year end.",
                    "extractedCategory": "it_services",
                }),
            ),
            bant_advance(
                "Budget noted.",
                json!({ "BUDGET": "Up to $20,000" }),
                "Who makes the final call?",
            ),
            bant_advance(
                "Good to know.",
                json!({ "AUTHORITY": "Priya, Head of Ops" }),
                "What's driving this?",
            ),
            bant_advance(
                "Understood.",
                json!({ "NEED": "Current provider exits the market" }),
                "When do you need it live?",
            ),
            bant_advance(
                "Almost done.",
                json!({ "TIMELINE": "Live by January" }),
                "Here's the full draft. Does it all look right?",
            ),
            (
                StatusCode::OK,
                json!({
                    "analysis": "Changed the headcount to 120.",
                    "isStageComplete": false,
                    "nextQuestion": "Anything else to adjust?",
                    "extractedTitle": "Payroll migration for 120 staff",
                }),
            ),
            (
                StatusCode::OK,
                json!({
                    "analysis": "All set, posting your requirement now.",
                    "isStageComplete": true,
                }),
            ),
        ];
        let (svc_url, _service) = start_interpreter(script).await;
        let (base, sink, store) = start_assist(&svc_url, None).await;
        let client = reqwest::Client::new();

        let (status, view) = post_json(
            &client,
            format!("{base}/api/assist/requirement/start"),
            json!({ "context": post_context() }),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(view["stage"], "DETAILS");

        // The first message seeds title, description and category.
        let (_, view) = send_text(
            &client,
            &base,
            "requirement",
            "I need payroll migrated for about 80 people",
        )
        .await;
        assert_eq!(view["stage"], "BUDGET");
        assert_eq!(view["data"]["title"], "Payroll migration for 80 staff");
        assert_eq!(view["data"]["category"], "it_services");

        send_text(&client, &base, "requirement", "up to 20k").await;
        send_text(&client, &base, "requirement", "I decide, with finance").await;
        send_text(&client, &base, "requirement", "our provider is shutting down").await;
        let (_, view) = send_text(&client, &base, "requirement", "january at the latest").await;
        assert_eq!(view["stage"], "REVIEW");
        assert_eq!(view["data"]["qualificationData"]["TIMELINE"], "Live by January");

        // An edit request keeps the session in review.
        let (_, view) = send_text(&client, &base, "requirement", "make it 120 people actually").await;
        assert_eq!(view["stage"], "REVIEW");
        assert_eq!(view["data"]["title"], "Payroll migration for 120 staff");
        assert!(view.get("completion").is_none());

        // Confirmation posts it.
        let (status, view) = send_text(&client, &base, "requirement", "looks right, go ahead").await;
        assert_eq!(status, 200);
        assert_eq!(view["stage"], "COMPLETED");
        assert_eq!(view["completion"]["kind"], "requirement");
        assert_eq!(view["completion"]["title"], "Payroll migration for 120 staff");
        assert_eq!(
            view["completion"]["description"],
            "Move an 80-person payroll onto a managed platform before year end."
        );
        assert_eq!(view["completion"]["category"], "it_services");

        let delivered = sink.delivered.lock().await;
        assert_eq!(delivered.len(), 1);
        match &delivered[0] {
            Completion::Requirement(post) => {
                assert_eq!(post.title, "Payroll migration for 120 staff");
                assert_eq!(post.qualification_data.budget, "Up to $20,000");
            }
            other => panic!("expected a requirement, got {other:?}"),
        }
        drop(delivered);

        assert!(store.fetch("requirement_draft_session").await.unwrap().is_none());
    })
    .await
    .expect("test timed out");
}

// ── Session lifecycle over the API ───────────────────────────────────

#[tokio::test]
async fn start_resumes_stored_session_for_matching_context() {
    timeout(TEST_TIMEOUT, async {
        let script = vec![advance("Noted.", "$7k", "Who decides?")];
        let (svc_url, _service) = start_interpreter(script).await;
        let (base, _sink, store) = start_assist(&svc_url, None).await;
        let client = reqwest::Client::new();

        post_json(
            &client,
            format!("{base}/api/assist/qualify/start"),
            json!({ "context": inquiry_context() }),
        )
        .await;
        send_text(&client, &base, "qualify", "seven thousand").await;

        // Same context: picks up where it left off.
        let (_, view) = post_json(
            &client,
            format!("{base}/api/assist/qualify/start"),
            json!({ "context": inquiry_context() }),
        )
        .await;
        assert_eq!(view["stage"], "AUTHORITY");
        assert_eq!(view["messages"].as_array().unwrap().len(), 4);
        assert_eq!(view["data"]["BUDGET"], "$7k");

        // A different contact discards the stored session.
        let other = json!({
            "contact_name": "Sam Ortiz",
            "contact_email": "sam@other.example",
            "subject": {
                "kind": "service_inquiry",
                "service_id": "svc-301",
                "service_name": "Payroll Migration",
                "vendor_name": "Ledgerline",
            },
        });
        let (_, view) = post_json(
            &client,
            format!("{base}/api/assist/qualify/start"),
            json!({ "context": other }),
        )
        .await;
        assert_eq!(view["stage"], "BUDGET");
        assert_eq!(view["messages"].as_array().unwrap().len(), 1);

        // The mismatched record was actively cleared.
        assert!(store.fetch("lead_qualification_session").await.unwrap().is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn stale_session_id_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let script = vec![advance("Noted.", "$3k", "Who decides?")];
        let (svc_url, _service) = start_interpreter(script).await;
        let (base, _sink, _store) = start_assist(&svc_url, None).await;
        let client = reqwest::Client::new();

        let (_, view) = post_json(
            &client,
            format!("{base}/api/assist/qualify/start"),
            json!({ "context": inquiry_context() }),
        )
        .await;
        let old_id = view["sessionId"].as_str().unwrap().to_string();

        // Restarting hands out a new session id.
        let (_, view) = post_json(
            &client,
            format!("{base}/api/assist/qualify/start"),
            json!({ "context": inquiry_context() }),
        )
        .await;
        let new_id = view["sessionId"].as_str().unwrap().to_string();
        assert_ne!(old_id, new_id);

        let (status, body) = post_json(
            &client,
            format!("{base}/api/assist/qualify/message"),
            json!({ "sessionId": old_id, "text": "three thousand" }),
        )
        .await;
        assert_eq!(status, 409);
        assert!(body["error"].as_str().unwrap().contains("replaced"));

        let (status, view) = post_json(
            &client,
            format!("{base}/api/assist/qualify/message"),
            json!({ "sessionId": new_id, "text": "three thousand" }),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(view["stage"], "AUTHORITY");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn reset_clears_the_stored_session() {
    timeout(TEST_TIMEOUT, async {
        let script = vec![advance("Noted.", "$4k", "Who decides?")];
        let (svc_url, _service) = start_interpreter(script).await;
        let (base, _sink, store) = start_assist(&svc_url, None).await;
        let client = reqwest::Client::new();

        post_json(
            &client,
            format!("{base}/api/assist/qualify/start"),
            json!({ "context": inquiry_context() }),
        )
        .await;
        send_text(&client, &base, "qualify", "four thousand").await;
        assert!(store.fetch("lead_qualification_session").await.unwrap().is_some());

        let (status, view) = post_json(
            &client,
            format!("{base}/api/assist/qualify/reset"),
            json!({}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(view["stage"], "BUDGET");
        assert_eq!(view["messages"].as_array().unwrap().len(), 1);
        assert_eq!(view["completed"], false);

        assert!(store.fetch("lead_qualification_session").await.unwrap().is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn assistants_keep_separate_sessions() {
    timeout(TEST_TIMEOUT, async {
        let (svc_url, _service) = start_interpreter(Vec::new()).await;
        let (base, _sink, _store) = start_assist(&svc_url, None).await;
        let client = reqwest::Client::new();

        post_json(
            &client,
            format!("{base}/api/assist/qualify/start"),
            json!({ "context": inquiry_context() }),
        )
        .await;
        post_json(
            &client,
            format!("{base}/api/assist/requirement/start"),
            json!({ "context": post_context() }),
        )
        .await;

        let qualify: Value = client
            .get(format!("{base}/api/assist/qualify"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(qualify["stage"], "BUDGET");

        let requirement: Value = client
            .get(format!("{base}/api/assist/requirement"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(requirement["stage"], "DETAILS");
    })
    .await
    .expect("test timed out");
}

// ── Missing-session and health endpoints ─────────────────────────────

#[tokio::test]
async fn message_before_start_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let (svc_url, _service) = start_interpreter(Vec::new()).await;
        let (base, _sink, _store) = start_assist(&svc_url, None).await;
        let client = reqwest::Client::new();

        let (status, body) = send_text(&client, &base, "qualify", "hello").await;
        assert_eq!(status, 404);
        assert!(body["error"].as_str().unwrap().contains("start"));

        let resp = client
            .get(format!("{base}/api/assist/requirement"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn health_reports_service_name() {
    timeout(TEST_TIMEOUT, async {
        let (svc_url, _service) = start_interpreter(Vec::new()).await;
        let (base, _sink, _store) = start_assist(&svc_url, None).await;

        let resp = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "lead-assist");
    })
    .await
    .expect("test timed out");
}
