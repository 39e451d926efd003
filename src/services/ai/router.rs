use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::models::GenerationRequest;
use crate::services::ai::{BackendOutcome, GenerationBackend, BALANCED_CHAIN};

/// Delay between the first and second pass, sized to let per-minute quota
/// windows reset.
const RETRY_COOLDOWN: Duration = Duration::from_secs(7);

/// Upper bound on full passes through the chain. The second pass is only
/// taken when every attempt in the first came back rate-limited; this is a
/// deliberate cap, not generic retry machinery.
const MAX_PASSES: usize = 2;

/// Returned when both passes exhaust the chain with every model rate-limited.
/// Distinct wording from any backend error so callers can present it as a
/// "wait and retry" condition.
pub const BUSY_MESSAGE: &str =
    "All AI models are busy right now. Please try again in a few minutes.";

/// One backend call within a pass, finalized once its outcome is known.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    pub model: String,
    pub elapsed: Duration,
    pub rate_limited: bool,
    /// Backend error message; present for rate-limited and hard failures,
    /// absent on success.
    pub error: Option<String>,
}

/// Diagnostics for one [`ModelRouter::route`] invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RouterMetadata {
    /// Model that produced the successful response, absent on failure.
    pub chosen_model: Option<String>,
    /// Wall-clock time across all passes, cooldown included.
    pub total_elapsed: Duration,
    /// Every backend call made, in chronological order across both passes.
    pub attempts: Vec<AttemptRecord>,
}

/// Outcome of one [`ModelRouter::route`] invocation
///
/// The payload is present iff the call succeeded; `error` is present iff it
/// did not. Runtime backend failures are always reported this way, never as
/// a panic or `Err`.
#[derive(Debug, Clone, Serialize)]
pub struct RouterResult {
    pub payload: Option<serde_json::Value>,
    pub error: Option<String>,
    pub metadata: RouterMetadata,
}

impl RouterResult {
    pub fn is_success(&self) -> bool {
        self.payload.is_some()
    }

    /// True when both passes exhausted the chain with every model
    /// rate-limited, as opposed to a hard backend failure.
    pub fn is_exhausted(&self) -> bool {
        self.error.as_deref() == Some(BUSY_MESSAGE)
    }
}

/// Outcome of one full pass through the chain.
enum PassOutcome {
    Success {
        model: String,
        payload: serde_json::Value,
    },
    HardFailure {
        message: String,
    },
    AllRateLimited,
}

/// Routes generation requests across a prioritized chain of models
///
/// Models are tried strictly in chain order, one at a time: ordered
/// preference is the point, and stopping at the first success avoids burning
/// quota on lower-priority models. The router holds no state between
/// invocations; concurrent calls share no quota bookkeeping, so every call
/// may independently pay the cooldown penalty.
pub struct ModelRouter {
    backend: Arc<dyn GenerationBackend>,
}

impl ModelRouter {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Runs `request` against `chain` (default [`BALANCED_CHAIN`]) and
    /// returns the first successful response.
    ///
    /// Rate-limited attempts fall through to the next model in the chain;
    /// any other failure aborts the pass immediately and is surfaced as a
    /// structured failure. If an entire pass comes back rate-limited the
    /// router sleeps once and retries the chain from the top, exactly once.
    ///
    /// # Panics
    ///
    /// Panics if `chain` is empty. An empty chain is a misconfiguration,
    /// not a runtime condition; HTTP handlers validate chain input before
    /// calling in.
    pub async fn route(
        &self,
        request: &GenerationRequest,
        api_key: &str,
        chain: Option<&[&str]>,
    ) -> RouterResult {
        let chain = chain.unwrap_or(BALANCED_CHAIN);
        assert!(!chain.is_empty(), "model priority chain must not be empty");

        let started = Instant::now();
        let mut attempts = Vec::new();

        for pass in 1..=MAX_PASSES {
            match self.run_pass(chain, request, api_key, &mut attempts).await {
                PassOutcome::Success { model, payload } => {
                    tracing::info!(
                        model = %model,
                        pass,
                        attempts = attempts.len(),
                        "Generation succeeded"
                    );
                    return RouterResult {
                        payload: Some(payload),
                        error: None,
                        metadata: RouterMetadata {
                            chosen_model: Some(model),
                            total_elapsed: started.elapsed(),
                            attempts,
                        },
                    };
                }
                PassOutcome::HardFailure { message } => {
                    tracing::error!(error = %message, pass, "Generation failed");
                    return RouterResult {
                        payload: None,
                        error: Some(message),
                        metadata: RouterMetadata {
                            chosen_model: None,
                            total_elapsed: started.elapsed(),
                            attempts,
                        },
                    };
                }
                PassOutcome::AllRateLimited if pass < MAX_PASSES => {
                    tracing::warn!(
                        models = chain.len(),
                        cooldown_secs = RETRY_COOLDOWN.as_secs(),
                        "Every model rate-limited; cooling down before the retry pass"
                    );
                    tokio::time::sleep(RETRY_COOLDOWN).await;
                }
                PassOutcome::AllRateLimited => {}
            }
        }

        tracing::warn!(
            attempts = attempts.len(),
            "Both passes exhausted; every model rate-limited"
        );
        RouterResult {
            payload: None,
            error: Some(BUSY_MESSAGE.to_string()),
            metadata: RouterMetadata {
                chosen_model: None,
                total_elapsed: started.elapsed(),
                attempts,
            },
        }
    }

    /// One sequential pass over the chain, appending to the shared attempt
    /// log as it goes.
    async fn run_pass(
        &self,
        chain: &[&str],
        request: &GenerationRequest,
        api_key: &str,
        attempts: &mut Vec<AttemptRecord>,
    ) -> PassOutcome {
        for model in chain {
            let attempt_started = Instant::now();
            let outcome = self.backend.generate(model, request, api_key).await;
            let elapsed = attempt_started.elapsed();

            match outcome {
                BackendOutcome::Success(payload) => {
                    attempts.push(AttemptRecord {
                        model: (*model).to_string(),
                        elapsed,
                        rate_limited: false,
                        error: None,
                    });
                    return PassOutcome::Success {
                        model: (*model).to_string(),
                        payload,
                    };
                }
                BackendOutcome::RateLimited { message } => {
                    tracing::warn!(
                        model = %model,
                        error = %message,
                        "Model rate-limited, trying next in chain"
                    );
                    attempts.push(AttemptRecord {
                        model: (*model).to_string(),
                        elapsed,
                        rate_limited: true,
                        error: Some(message),
                    });
                }
                BackendOutcome::Failed { status, message } => {
                    tracing::error!(
                        model = %model,
                        status = ?status,
                        error = %message,
                        "Model call failed hard, aborting pass"
                    );
                    attempts.push(AttemptRecord {
                        model: (*model).to_string(),
                        elapsed,
                        rate_limited: false,
                        error: Some(message.clone()),
                    });
                    return PassOutcome::HardFailure { message };
                }
            }
        }

        PassOutcome::AllRateLimited
    }
}
