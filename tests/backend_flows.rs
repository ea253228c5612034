use std::time::Duration;

use serde_json::json;
use voidweaver::ai::{ApiConfig, BackendClient, GenerateRequest};
use voidweaver::merge::RemoteModule;
use voidweaver::model::{EngineType, Tag};
use voidweaver::sse::StreamEvent;
use voidweaver::state::EngineSettings;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> BackendClient {
    let mut config = ApiConfig::with_base_url(format!("{}/api", server.uri()));
    config.retry_delay = Duration::from_millis(10);
    BackendClient::new(config)
}

fn request() -> GenerateRequest {
    GenerateRequest::new(
        "1girl, 1.5::rain::".to_string(),
        &EngineSettings::default(),
        "nai-key".to_string(),
        None,
    )
}

#[tokio::test]
async fn analyze_posts_image_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .and(body_partial_json(json!({"imageData": "aW1n", "geminiApiKey": "g-key"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "modules": [
                {"name": "style", "displayName": "Style", "tags": [{"id": "t1", "text": "ink", "weight": 1.5}]},
                {"name": "Subject", "tags": [{"text": "cat"}]}
            ],
            "rawPrompt": "ink, cat"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client(&server).analyze_image("aW1n", "g-key").await.unwrap();
    assert_eq!(resp.raw_prompt, "ink, cat");
    assert_eq!(resp.modules.len(), 2);
    assert_eq!(resp.modules[1].tags[0].weight, 1.0);
}

#[tokio::test]
async fn generate_sends_engine_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "prompt": "1girl, 1.5::rain::",
            "engine": "novelai",
            "novelaiApiKey": "nai-key",
            "resolution": "832x1216",
            "steps": 28,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"imageData": "cGl4"})))
        .mount(&server)
        .await;

    let result = client(&server).generate_image(&request()).await.unwrap();
    assert_eq!(result.image_data, "cGl4");
    assert!(result.thinking_log.is_none());
}

#[tokio::test]
async fn invalid_request_never_leaves_the_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut req = request();
    req.steps = 0;
    assert!(client(&server).generate_image(&req).await.is_err());
}

#[tokio::test]
async fn refine_round_trips_modules() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/refine"))
        .and(body_partial_json(json!({"instruction": "make it night", "geminiApiKey": "g"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "modules": [{"name": "ATMOSPHERE", "tags": [{"text": "moonlight", "weight": 2.0}]}]
        })))
        .mount(&server)
        .await;

    let modules = vec![RemoteModule::new("atmosphere", vec![Tag::plain("noon")])];
    let resp = client(&server)
        .refine_modules(modules, "make it night", "g")
        .await
        .unwrap();
    assert_eq!(resp.modules[0].name, "ATMOSPHERE");
    assert_eq!(resp.modules[0].tags[0].text, "moonlight");
}

#[tokio::test]
async fn status_codes_map_to_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analyze"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": true, "message": "bad key", "code": "AUTH", "timestamp": 1
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/refine"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": true, "message": "Instruction is required", "code": "VALIDATION", "timestamp": 1
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let err = client.analyze_image("x", "k").await.unwrap_err();
    assert!(err.to_string().contains("API key invalid or expired"), "{err}");
    let err = client.refine_modules(vec![], "x", "k").await.unwrap_err();
    assert!(err.to_string().contains("Instruction is required"), "{err}");
}

#[tokio::test]
async fn server_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).generate_image(&request()).await.unwrap_err();
    assert!(err.to_string().contains("temporarily unavailable"), "{err}");
}

#[tokio::test]
async fn stream_reports_progress_then_result() {
    let server = MockServer::start().await;
    let body = "event: log\ndata: planning\n\n\
                event: sketch\ndata: c2s=\n\n\
                event: result\ndata: {\"imageData\":\"ZG9uZQ==\",\"sketchImage\":\"c2s=\"}\n\n";
    Mock::given(method("POST"))
        .and(path("/api/generate/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let mut seen = Vec::new();
    let result = client(&server)
        .generate_image_stream(&request(), |e| seen.push(e.clone()))
        .await
        .unwrap();
    assert_eq!(result.image_data, "ZG9uZQ==");
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0], StreamEvent::Log("planning".to_string()));
}

#[tokio::test]
async fn stream_error_event_fails_the_call() {
    let server = MockServer::start().await;
    let body = "event: log\ndata: planning\n\nevent: error\ndata: content filtered\n\n";
    Mock::given(method("POST"))
        .and(path("/api/generate/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate_image_stream(&request(), |_| {})
        .await
        .unwrap_err();
    assert!(err.to_string().contains("content filtered"), "{err}");
}

#[tokio::test]
async fn stream_without_result_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate/stream"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("event: log\ndata: hmm\n\n", "text/event-stream"),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .generate_image_stream(&request(), |_| {})
        .await
        .unwrap_err();
    assert!(err.to_string().contains("without a result"), "{err}");
}

#[tokio::test]
async fn google_engine_sends_credentials_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "engine": "google-imagen",
            "googleCredentials": "{\"type\":\"service_account\"}"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"imageData": "Zw=="})))
        .expect(1)
        .mount(&server)
        .await;

    let settings = EngineSettings {
        engine: EngineType::GoogleImagen,
        ..EngineSettings::default()
    };
    let req = GenerateRequest::new(
        "sky".to_string(),
        &settings,
        "{\"type\":\"service_account\"}".to_string(),
        None,
    );
    client(&server).generate_image(&req).await.unwrap();
}
