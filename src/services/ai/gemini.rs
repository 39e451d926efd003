/// Google Gemini generation backend
///
/// Thin client over the `generateContent` REST endpoint. Owns the wire
/// formats and the failure classification; the router upstream only ever
/// sees the classified [`BackendOutcome`].
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::GenerationRequest;
use crate::services::ai::{BackendOutcome, GenerationBackend};

/// Error `status` marker Gemini reports when a quota window is exhausted.
const RESOURCE_EXHAUSTED: &str = "RESOURCE_EXHAUSTED";

#[derive(Clone)]
pub struct GeminiBackend {
    http_client: HttpClient,
    api_url: String,
}

impl GeminiBackend {
    pub fn new(api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
        }
    }

    fn build_model_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            model
        )
    }

    fn build_payload(request: &GenerationRequest) -> Value {
        let mut generation_config = json!({});
        if let Some(temperature) = request.temperature {
            generation_config["temperature"] = json!(temperature);
        }
        if let Some(max_output_tokens) = request.max_output_tokens {
            generation_config["maxOutputTokens"] = json!(max_output_tokens);
        }

        json!({
            "contents": [{"parts": [{"text": request.prompt}]}],
            "generationConfig": generation_config,
        })
    }
}

/// Error envelope Gemini returns on non-2xx responses.
#[derive(Deserialize)]
struct GeminiErrorEnvelope {
    error: Option<GeminiErrorDetail>,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Classifies a non-2xx backend response as rate-limited or a hard failure.
///
/// Rate-limited when any of: HTTP 429, the structured error `status` equals
/// RESOURCE_EXHAUSTED, or the message mentions rate limits or quota
/// (case-insensitive). Everything else is a hard failure.
fn classify_failure(status: u16, body: &str) -> BackendOutcome {
    let detail = serde_json::from_str::<GeminiErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error);

    let marker = detail.as_ref().and_then(|detail| detail.status.clone());
    let message = detail
        .and_then(|detail| detail.message)
        .unwrap_or_else(|| body.trim().to_string());

    let lowered = message.to_lowercase();
    let rate_limited = status == 429
        || marker.as_deref() == Some(RESOURCE_EXHAUSTED)
        || lowered.contains("rate limit")
        || lowered.contains("quota");

    if rate_limited {
        BackendOutcome::RateLimited { message }
    } else {
        BackendOutcome::Failed {
            status: Some(status),
            message,
        }
    }
}

/// Extracts the generated text from a successful response payload.
///
/// Reads the first candidate's first content part. Returns `None` for any
/// missing or malformed shape; never panics.
pub fn extract_text(payload: &Value) -> Option<String> {
    payload
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(
        &self,
        model: &str,
        request: &GenerationRequest,
        api_key: &str,
    ) -> BackendOutcome {
        let url = self.build_model_url(model);

        tracing::debug!(model = %model, "Calling generation backend");

        let response = match self
            .http_client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&Self::build_payload(request))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return BackendOutcome::Failed {
                    status: None,
                    message: format!("Request to generation backend failed: {}", e),
                }
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return classify_failure(status.as_u16(), &body);
        }

        match serde_json::from_str::<Value>(&body) {
            Ok(payload) => BackendOutcome::Success(payload),
            Err(e) => BackendOutcome::Failed {
                status: Some(status.as_u16()),
                message: format!("Invalid JSON from generation backend: {}", e),
            },
        }
    }
}
