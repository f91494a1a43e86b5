//! End-to-end route tests over the assembled router, with the generator
//! behind a wiremock OpenAI endpoint.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use timbre_server::TimbreServer;
use timbre_settings::TimbreSettings;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings_for(base_url: &str) -> TimbreSettings {
    let mut settings = TimbreSettings::default();
    settings.generator.base_url = base_url.to_string();
    settings.generator.api_key = Some("test-key".into());
    settings
}

async fn server_with_completion(reply: &str) -> (TimbreServer, MockServer) {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": reply } }]
        })))
        .mount(&mock)
        .await;
    let server = TimbreServer::from_settings(settings_for(&mock.uri()), None).unwrap();
    (server, mock)
}

async fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let (server, _mock) = server_with_completion("unused").await;
    let resp = server
        .router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["profiles"], 5);
}

#[tokio::test]
async fn profiles_lists_neutral_first() {
    let (server, _mock) = server_with_completion("unused").await;
    let resp = server
        .router()
        .oneshot(Request::builder().uri("/profiles").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    let personalities = body["personalities"].as_array().unwrap();
    assert_eq!(personalities.len(), 5);
    assert_eq!(personalities[0]["id"], "neutral");
    assert!(personalities[0]["description"].is_string());
}

#[tokio::test]
async fn transform_requires_fields() {
    let (server, _mock) = server_with_completion("unused").await;
    let req = json_request("/transform", json!({ "originalResponse": "hi" })).await;
    let resp = server.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = read_json(resp).await;
    assert_eq!(
        body["error"],
        "Missing required fields: originalResponse and personalityId"
    );
}

#[tokio::test]
async fn transform_neutral_is_passthrough() {
    let (server, mock) = server_with_completion("REWRITTEN").await;
    let req = json_request(
        "/transform",
        json!({ "originalResponse": "plain answer", "personalityId": "neutral" }),
    )
    .await;
    let resp = server.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["transformedResponse"], "plain answer");
    assert_eq!(body["success"], true);
    assert!(mock.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn transform_applies_profile() {
    let (server, _mock) = server_with_completion("REWRITTEN").await;
    let req = json_request(
        "/transform",
        json!({ "originalResponse": "plain answer", "personalityId": "direct_coach" }),
    )
    .await;
    let resp = server.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["originalResponse"], "plain answer");
    assert_eq!(body["transformedResponse"], "REWRITTEN");
    assert_eq!(body["personalityId"], "direct_coach");
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn intercept_neutral_is_passthrough() {
    let (server, mock) = server_with_completion("REWRITTEN").await;
    let req = json_request("/intercept", json!({ "response": "raw" })).await;
    let resp = server.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["response"], "raw");
    assert_eq!(body["transformed"], false);
    assert!(body.get("original").is_none());
    assert!(body.get("error").is_none());
    assert!(mock.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn intercept_applies_profile_and_keeps_original() {
    let (server, _mock) = server_with_completion("REWRITTEN").await;
    let req = json_request(
        "/intercept",
        json!({
            "response": "raw",
            "personalityId": "warm_mentor",
            "userMessage": "can you explain again?"
        }),
    )
    .await;
    let resp = server.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["response"], "REWRITTEN");
    assert_eq!(body["transformed"], true);
    assert_eq!(body["original"], "raw");
    assert_eq!(body["personalityId"], "warm_mentor");
}

#[tokio::test]
async fn intercept_falls_back_on_generator_failure() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "message": "upstream down" }
        })))
        .mount(&mock)
        .await;
    let server = TimbreServer::from_settings(settings_for(&mock.uri()), None).unwrap();

    let req = json_request(
        "/intercept",
        json!({ "response": "raw", "personalityId": "warm_mentor" }),
    )
    .await;
    let resp = server.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = read_json(resp).await;
    assert_eq!(body["response"], "raw");
    assert_eq!(body["transformed"], false);
    // Failure-driven fallbacks surface the reason; the consumer can tell
    // "backend broke" apart from "nothing to do".
    let error = body["error"].as_str().expect("error field");
    assert!(error.contains("upstream down"), "unexpected error: {error}");
}

#[tokio::test]
async fn bearer_auth_guards_api_routes_but_not_health() {
    let mock = MockServer::start().await;
    let mut settings = settings_for(&mock.uri());
    settings.server.api_key = Some("sekrit".into());
    let server = TimbreServer::from_settings(settings, None).unwrap();
    let router = server.router();

    let unauthed = router
        .clone()
        .oneshot(Request::builder().uri("/profiles").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(unauthed.status(), StatusCode::UNAUTHORIZED);

    let authed = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/profiles")
                .header(header::AUTHORIZATION, "Bearer sekrit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(authed.status(), StatusCode::OK);

    let health = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn chat_streams_final_envelope() {
    let (server, _mock) = server_with_completion("generated reply").await;
    let req = json_request("/chat", json!({ "text": "what is recursion?" })).await;
    let resp = server.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    let event_line = body
        .lines()
        .find(|l| l.starts_with("data: "))
        .expect("one data event");
    let envelope: Value = serde_json::from_str(&event_line["data: ".len()..]).unwrap();

    assert_eq!(envelope["final"], true);
    // An untitled conversation still carries the key, as an explicit null.
    assert!(envelope.as_object().unwrap().contains_key("title"));
    assert_eq!(envelope["title"], Value::Null);
    assert_eq!(envelope["conversation"]["title"], Value::Null);
    assert_eq!(envelope["requestMessage"]["text"], "what is recursion?");
    assert_eq!(envelope["responseMessage"]["text"], "generated reply");
    assert_eq!(envelope["transformed"], false);
}

#[tokio::test]
async fn chat_profile_header_applies_when_body_omits_one() {
    let mock = MockServer::start().await;
    // First completion call generates the reply; the second rewrites it.
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "generated reply" } }]
        })))
        .up_to_n_times(1)
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "STYLED" } }]
        })))
        .mount(&mock)
        .await;
    let server = TimbreServer::from_settings(settings_for(&mock.uri()), None).unwrap();

    let req = Request::builder()
        .method("POST")
        .uri("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-personality", "direct_coach")
        .body(Body::from(json!({ "text": "hello" }).to_string()))
        .unwrap();
    let resp = server.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    let event_line = body
        .lines()
        .find(|l| l.starts_with("data: "))
        .expect("one data event");
    let envelope: Value = serde_json::from_str(&event_line["data: ".len()..]).unwrap();

    assert_eq!(envelope["transformed"], true);
    assert_eq!(envelope["responseMessage"]["text"], "STYLED");
}

#[tokio::test]
async fn chat_session_cleans_up_after_delivery() {
    let (server, _mock) = server_with_completion("generated reply").await;
    let state = server.state().clone();
    let req = json_request("/chat", json!({ "text": "hello there" })).await;
    let resp = server.router().oneshot(req).await.unwrap();
    let _ = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();

    // Persistence and cleanup happen on the orchestrator task after the
    // envelope is emitted; poll briefly for the registry to drain.
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while !state.orchestrator.cancels().is_empty() {
        assert!(std::time::Instant::now() < deadline, "cleanup never ran");
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
