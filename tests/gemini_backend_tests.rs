use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use marquee_api::models::GenerationRequest;
use marquee_api::services::ai::gemini::{extract_text, GeminiBackend};
use marquee_api::services::ai::router::ModelRouter;
use marquee_api::services::ai::{BackendOutcome, GenerationBackend};

fn request() -> GenerationRequest {
    GenerationRequest {
        prompt: "Suggest a watchlist theme".to_string(),
        temperature: Some(0.7),
        max_output_tokens: Some(64),
    }
}

fn candidates_body(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    })
}

#[tokio::test]
async fn generate_posts_prompt_and_returns_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(query_param("key", "test_key"))
        .and(body_partial_json(json!({
            "contents": [{"parts": [{"text": "Suggest a watchlist theme"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidates_body("Heist classics")))
        .expect(1)
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(server.uri());
    let outcome = backend
        .generate("gemini-2.5-flash", &request(), "test_key")
        .await;

    match outcome {
        BackendOutcome::Success(payload) => {
            assert_eq!(extract_text(&payload).as_deref(), Some("Heist classics"));
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn generate_classifies_429_as_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/model-a:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "code": 429,
                "message": "Resource has been exhausted (e.g. check quota).",
                "status": "RESOURCE_EXHAUSTED"
            }
        })))
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(server.uri());
    let outcome = backend.generate("model-a", &request(), "test_key").await;

    assert!(matches!(outcome, BackendOutcome::RateLimited { .. }));
}

#[tokio::test]
async fn generate_classifies_auth_failure_as_hard() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/model-a:generateContent"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(server.uri());
    let outcome = backend.generate("model-a", &request(), "bad_key").await;

    match outcome {
        BackendOutcome::Failed { status, message } => {
            assert_eq!(status, Some(400));
            assert!(message.contains("API key not valid"));
        }
        other => panic!("expected hard failure, got {:?}", other),
    }
}

#[tokio::test]
async fn generate_connection_error_is_a_hard_failure() {
    // Nothing is listening here; the request never produces a response.
    let backend = GeminiBackend::new("http://127.0.0.1:9".to_string());
    let outcome = backend.generate("model-a", &request(), "test_key").await;

    match outcome {
        BackendOutcome::Failed { status, .. } => assert_eq!(status, None),
        other => panic!("expected hard failure, got {:?}", other),
    }
}

#[tokio::test]
async fn router_falls_back_across_models_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/model-a:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/model-b:generateContent"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(candidates_body("Cozy crime nights")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let router = ModelRouter::new(Arc::new(GeminiBackend::new(server.uri())));
    let result = router
        .route(&request(), "test_key", Some(&["model-a", "model-b"]))
        .await;

    assert!(result.is_success());
    assert_eq!(result.metadata.chosen_model.as_deref(), Some("model-b"));
    assert_eq!(result.metadata.attempts.len(), 2);
    assert!(result.metadata.attempts[0].rate_limited);
}
