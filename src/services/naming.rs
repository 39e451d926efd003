use crate::models::{GenerationRequest, RowName};
use crate::services::ai::gemini::extract_text;
use crate::services::ai::router::ModelRouter;
use crate::services::ai::FAST_CHAIN;

/// Fallback used when a row has no titles to derive a name from.
const DEFAULT_ROW_NAME: &str = "My picks";

/// Longest name we let a model put on a row.
const MAX_NAME_CHARS: usize = 40;

/// Suggests a display name for a custom "smart" row built from `titles`
///
/// Routes on the speed-first chain: naming runs on every row edit, so
/// latency matters more than polish. On any router failure the row gets a
/// non-AI fallback name; callers never see an error from this function.
pub async fn suggest_row_name(router: &ModelRouter, api_key: &str, titles: &[String]) -> RowName {
    let fallback = fallback_name(titles);
    if titles.is_empty() {
        return RowName {
            name: fallback,
            ai_generated: false,
        };
    }

    let request = GenerationRequest {
        prompt: naming_prompt(titles),
        temperature: Some(0.8),
        max_output_tokens: Some(16),
    };

    let result = router.route(&request, api_key, Some(FAST_CHAIN)).await;

    let Some(payload) = &result.payload else {
        tracing::warn!(
            error = result.error.as_deref().unwrap_or("unknown"),
            attempts = result.metadata.attempts.len(),
            "Row naming fell back to the default name"
        );
        return RowName {
            name: fallback,
            ai_generated: false,
        };
    };

    match extract_text(payload).map(|text| sanitize_name(&text)) {
        Some(name) if !name.is_empty() => RowName {
            name,
            ai_generated: true,
        },
        _ => {
            tracing::warn!("Model returned no usable text for row naming");
            RowName {
                name: fallback,
                ai_generated: false,
            }
        }
    }
}

fn naming_prompt(titles: &[String]) -> String {
    format!(
        "Suggest one short, catchy name (at most four words) for a watchlist \
         row containing: {}. Reply with the name only.",
        titles.join(", ")
    )
}

/// Non-AI name: lead title plus a suffix, or a fixed default for empty rows.
fn fallback_name(titles: &[String]) -> String {
    match titles.first() {
        Some(first) => format!("{} & more", first),
        None => DEFAULT_ROW_NAME.to_string(),
    }
}

/// Models occasionally wrap the name in quotes or add trailing punctuation.
fn sanitize_name(raw: &str) -> String {
    let first_line = raw.trim().lines().next().unwrap_or("");
    first_line
        .trim_end_matches(['.', ',', '!'])
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
        .trim_end_matches(['.', ','])
        .chars()
        .take(MAX_NAME_CHARS)
        .collect::<String>()
        .trim()
        .to_string()
}
