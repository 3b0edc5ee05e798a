use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::config::ExtractionMode;
use crate::AppState;

pub async fn index() -> impl IntoResponse {
    let body = json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "GET /health",
            "generateQuestions": "POST /api/generate-questions",
            "gradeExam": "POST /api/grade-exam",
            "literaryCommentary": "POST /api/literary-commentary",
        },
    });
    (StatusCode::OK, Json(body))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mode = match state.extraction_service.mode() {
        ExtractionMode::Native => "native",
        ExtractionMode::Placeholder => "placeholder",
    };
    let body = json!({
        "status": "ok",
        "llmConfigured": state.ai_service.is_configured(),
        "model": state.ai_service.model(),
        "extractionMode": mode,
    });
    (StatusCode::OK, Json(body))
}
