/// AI generation backend abstraction
///
/// This module provides a pluggable seam between the fallback router and the
/// remote generation API. The concrete Gemini client lives in [`gemini`]; the
/// router only ever sees the classified [`BackendOutcome`].
use crate::models::GenerationRequest;

pub mod gemini;
pub mod router;

/// Default priority chain: quality-first, used by most callers.
pub const BALANCED_CHAIN: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-2.0-flash",
];

/// Speed-first chain for high-frequency, latency-sensitive callers
/// (e.g. row naming, which runs on every edit).
pub const FAST_CHAIN: &[&str] = &[
    "gemini-2.5-flash-lite",
    "gemini-2.0-flash",
    "gemini-2.5-flash",
];

/// Classified result of one backend call, produced by the backend itself so
/// the fallback loop reduces to a three-way match.
#[derive(Debug, Clone)]
pub enum BackendOutcome {
    /// 2xx response; the raw JSON payload is passed through untouched.
    Success(serde_json::Value),
    /// Quota exhaustion; expected and transient, the router moves on to the
    /// next model in the chain.
    RateLimited { message: String },
    /// Any other failure. `status` is absent for connection-level errors
    /// that never produced an HTTP response.
    Failed {
        status: Option<u16>,
        message: String,
    },
}

/// Trait for generation backends
///
/// Implementations must never return transport errors as panics or `Err`;
/// every failure mode is folded into [`BackendOutcome`] so the router's
/// control flow stays a pure function of classified outcomes.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Runs one generation attempt against `model`.
    ///
    /// The request payload and API key are forwarded verbatim; the backend
    /// does not validate or transform them beyond building the wire format.
    async fn generate(
        &self,
        model: &str,
        request: &GenerationRequest,
        api_key: &str,
    ) -> BackendOutcome;
}
