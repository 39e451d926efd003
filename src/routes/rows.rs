use axum::{extract::State, Json};
use serde::Deserialize;

use crate::{error::AppResult, models::RowName, services::naming, state::AppState};

#[derive(Debug, Deserialize)]
pub struct RowNameRequest {
    pub titles: Vec<String>,
}

/// Handler for the smart-row naming endpoint
///
/// Always answers 200: a router failure degrades to a non-AI fallback name
/// rather than failing the request.
pub async fn name_row(
    State(state): State<AppState>,
    Json(request): Json<RowNameRequest>,
) -> AppResult<Json<RowName>> {
    let row_name = naming::suggest_row_name(&state.router, &state.api_key, &request.titles).await;
    Ok(Json(row_name))
}
