//! End-to-end tests against loopback stand-ins for the model server and the
//! grammar checker.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Form, Json, Router,
};
use improve_engine::config::Config;
use improve_engine::server::{router, AppState};
use improve_engine::{ContentFormat, Improver};
use improve_types::{ErrorBody, ImproveRequest, ImproveResult};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

const UNREACHABLE: &str = "http://127.0.0.1:1";

type Log = Arc<Mutex<Vec<Value>>>;

async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", address)
}

async fn record_and_reply(log: &Log, body: Value, reply: Value) -> Json<Value> {
    log.lock().unwrap().push(body);
    Json(reply)
}

/// Model server exposing only the given routes; everything else is a 404.
async fn spawn_model_server(routes: Vec<(&'static str, Value)>) -> (String, Log) {
    let log: Log = Arc::default();
    let mut app = Router::new();
    for (path, reply) in routes {
        let log = Arc::clone(&log);
        app = app.route(
            path,
            post(move |Json(body): Json<Value>| {
                let log = Arc::clone(&log);
                let reply = reply.clone();
                async move { record_and_reply(&log, body, reply).await }
            }),
        );
    }
    (spawn(app).await, log)
}

/// Grammar checker that flags "has" and "a apple" in "I has a apple.".
async fn checker(State(log): State<Log>, Form(form): Form<HashMap<String, String>>) -> Json<Value> {
    let text = form.get("text").cloned().unwrap_or_default();
    log.lock().unwrap().push(json!(form));

    let matches = if text.starts_with("I has a apple.") {
        // Out of order on purpose
        json!([
            { "offset": 6, "length": 1, "replacements": [{ "value": "an" }] },
            { "offset": 2, "length": 3, "replacements": [{ "value": "have" }, { "value": "had" }] },
        ])
    } else {
        json!([])
    };

    Json(json!({ "software": { "name": "LanguageTool" }, "matches": matches }))
}

async fn spawn_checker() -> (String, Log) {
    let log: Log = Arc::default();
    let app = Router::new()
        .route("/v2/check", post(checker))
        .with_state(Arc::clone(&log));
    (format!("{}/v2/check", spawn(app).await), log)
}

fn config(model_url: &str, checker_url: &str) -> Config {
    let mut config = Config::default();
    config.generative.base_url = model_url.to_string();
    config.grammar_check.endpoint = checker_url.to_string();
    config
}

#[tokio::test]
async fn test_openai_shape_reached_after_not_found() {
    let (model_url, model_log) = spawn_model_server(vec![(
        "/v1/chat/completions",
        json!({
            "choices": [{ "message": { "content": "```html\n<p>I have an apple.</p>\n```" } }]
        }),
    )])
    .await;

    let improver = Improver::from_config(&config(&model_url, UNREACHABLE)).unwrap();
    let result = improver.improve("<p>I has a apple.</p>").await.unwrap();

    assert_eq!(result.suggestion, "<p>I have an apple.</p>");
    assert_eq!(result.engine, "generative");
    assert_eq!(result.format, ContentFormat::Markup);

    let requests = model_log.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["model"], "llama3.1:8b");
    assert_eq!(requests[0]["messages"][0]["content"], "Return only corrected HTML.");
    let prompt = requests[0]["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.ends_with("HTML:\n<p>I has a apple.</p>"));
}

#[tokio::test]
async fn test_generate_shape_with_preamble() {
    let (model_url, _) = spawn_model_server(vec![(
        "/api/generate",
        json!({ "response": "Here's the corrected text: I have an apple.", "done": true }),
    )])
    .await;

    let improver = Improver::from_config(&config(&model_url, UNREACHABLE)).unwrap();
    let result = improver.improve("I has a apple.").await.unwrap();

    assert_eq!(result.suggestion, "I have an apple.");
    assert_eq!(result.engine, "generative");
}

#[tokio::test]
async fn test_server_error_is_terminal_for_generative() {
    let log: Log = Arc::default();
    let generate_log = Arc::clone(&log);
    let app = Router::new()
        .route(
            "/api/chat",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model crashed") }),
        )
        .route(
            "/api/generate",
            post(move |Json(body): Json<Value>| {
                let log = Arc::clone(&generate_log);
                async move { record_and_reply(&log, body, json!({ "response": "unused" })).await }
            }),
        );
    let model_url = spawn(app).await;
    let (checker_url, checker_log) = spawn_checker().await;

    let improver = Improver::from_config(&config(&model_url, &checker_url)).unwrap();
    let result = improver.improve("I has a apple.").await.unwrap();

    assert_eq!(result.suggestion, "I have an apple.");
    assert_eq!(result.engine, "grammar-check");
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(checker_log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unreachable_generative_falls_back_with_markup() {
    let (checker_url, checker_log) = spawn_checker().await;

    let improver = Improver::from_config(&config(UNREACHABLE, &checker_url)).unwrap();
    let result = improver
        .improve("<p>I has a apple.</p><p>it not was me</p>")
        .await
        .unwrap();

    assert_eq!(result.suggestion, "<p>I have an apple.</p><p>It wasn't me.</p>");
    assert_eq!(result.engine, "grammar-check");

    let forms = checker_log.lock().unwrap();
    assert_eq!(forms[0]["text"], "I has a apple.\n\nit not was me");
    assert_eq!(forms[0]["language"], "en-US");
    assert_eq!(forms[0]["level"], "picky");
    assert_eq!(forms[0]["enabledOnly"], "false");
}

#[tokio::test]
async fn test_fallback_applies_polisher_rules() {
    let (checker_url, _) = spawn_checker().await;

    let improver = Improver::from_config(&config(UNREACHABLE, &checker_url)).unwrap();
    let result = improver
        .improve("There are multiple numbers of students absent")
        .await
        .unwrap();

    assert_eq!(result.suggestion, "There are many students absent.");
    assert!(!result.suggestion.contains('<'));
}

#[tokio::test]
async fn test_format_mismatch_falls_back() {
    let (model_url, _) = spawn_model_server(vec![(
        "/api/chat",
        json!({ "message": { "role": "assistant", "content": "I have an apple." } }),
    )])
    .await;
    let (checker_url, _) = spawn_checker().await;

    let improver = Improver::from_config(&config(&model_url, &checker_url)).unwrap();
    let result = improver.improve("<p>I has a apple.</p>").await.unwrap();

    assert_eq!(result.suggestion, "<p>I have an apple.</p>");
    assert_eq!(result.engine, "grammar-check");
}

#[tokio::test]
async fn test_polish_only_fallback_without_network() {
    let mut config = config(UNREACHABLE, UNREACHABLE);
    config.grammar_check.enabled = false;

    let improver = Improver::from_config(&config).unwrap();
    let result = improver.improve("<p>pls send it</p>").await.unwrap();

    assert_eq!(result.suggestion, "<p>Please send it.</p>");
    assert_eq!(result.engine, "polish");
}

#[tokio::test]
async fn test_http_round_trip() {
    let (model_url, _) = spawn_model_server(vec![(
        "/api/chat",
        json!({ "message": { "content": "Hello there." } }),
    )])
    .await;
    let config = config(&model_url, UNREACHABLE);
    let improver = Improver::from_config(&config).unwrap();
    let base = spawn(router(AppState::new(improver), &config.server)).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({ "ok": true }));

    let response = client
        .post(format!("{base}/improve"))
        .json(&ImproveRequest::new("hello there"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let result: ImproveResult = response.json().await.unwrap();
    assert_eq!(result.suggestion, "Hello there.");
}

#[tokio::test]
async fn test_http_total_failure() {
    let config = config(UNREACHABLE, UNREACHABLE);
    let improver = Improver::from_config(&config).unwrap();
    let base = spawn(router(AppState::new(improver), &config.server)).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/improve"))
        .json(&ImproveRequest::new("hello"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "Internal error");
}
