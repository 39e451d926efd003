use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::GenerationRequest,
    services::ai::gemini::extract_text,
    services::ai::router::{AttemptRecord, RouterResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    /// Optional custom priority chain; defaults to the balanced chain.
    #[serde(default)]
    pub models: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub text: String,
    /// Model that produced the response.
    pub model: String,
    pub generated_at: DateTime<Utc>,
    pub total_elapsed_ms: u64,
    pub attempts: Vec<AttemptSummary>,
}

/// Wire form of one fallback attempt.
#[derive(Debug, Serialize)]
pub struct AttemptSummary {
    pub model: String,
    pub elapsed_ms: u64,
    pub rate_limited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&AttemptRecord> for AttemptSummary {
    fn from(attempt: &AttemptRecord) -> Self {
        Self {
            model: attempt.model.clone(),
            elapsed_ms: attempt.elapsed.as_millis() as u64,
            rate_limited: attempt.rate_limited,
            error: attempt.error.clone(),
        }
    }
}

/// Handler for the generation proxy endpoint
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> AppResult<Json<GenerateResponse>> {
    if request.prompt.trim().is_empty() {
        return Err(AppError::InvalidInput("Prompt cannot be empty".to_string()));
    }
    // An empty custom chain is caller misconfiguration; reject it here so it
    // never reaches the router's assertion.
    if matches!(&request.models, Some(models) if models.is_empty()) {
        return Err(AppError::InvalidInput(
            "Custom model list cannot be empty".to_string(),
        ));
    }

    let chain_input = request.models;
    let generation_request = GenerationRequest {
        prompt: request.prompt,
        temperature: request.temperature,
        max_output_tokens: request.max_output_tokens,
    };

    let chain: Option<Vec<&str>> = chain_input
        .as_ref()
        .map(|models| models.iter().map(String::as_str).collect());

    let result = state
        .router
        .route(&generation_request, &state.api_key, chain.as_deref())
        .await;

    into_response(result)
}

/// Maps a router result onto the HTTP failure taxonomy: hard failures are a
/// bad gateway, exhaustion is service-unavailable.
fn into_response(result: RouterResult) -> AppResult<Json<GenerateResponse>> {
    let attempts: Vec<AttemptSummary> = result
        .metadata
        .attempts
        .iter()
        .map(AttemptSummary::from)
        .collect();

    let Some(payload) = result.payload else {
        let exhausted = result.is_exhausted();
        let message = result
            .error
            .unwrap_or_else(|| "Generation failed".to_string());
        tracing::warn!(
            attempts = attempts.len(),
            exhausted,
            error = %message,
            "Generation request failed"
        );
        return Err(if exhausted {
            AppError::Busy(message)
        } else {
            AppError::Upstream(message)
        });
    };

    let text = extract_text(&payload).ok_or_else(|| {
        AppError::Upstream("Generation succeeded but returned no text".to_string())
    })?;

    Ok(Json(GenerateResponse {
        text,
        model: result.metadata.chosen_model.unwrap_or_default(),
        generated_at: Utc::now(),
        total_elapsed_ms: result.metadata.total_elapsed.as_millis() as u64,
        attempts,
    }))
}
