use serde::{Deserialize, Serialize};

/// Prompt payload forwarded verbatim to every model attempt
///
/// The router never inspects or mutates these fields; only the concrete
/// backend reads them to build its wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// Display name suggested for a custom "smart" row
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RowName {
    pub name: String,
    /// False when the name came from the non-AI fallback.
    pub ai_generated: bool,
}
