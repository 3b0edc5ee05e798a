use axum::extract::{FromRequest, Request, State};
use axum::Json;

use crate::dto::exam_dto::{GenerateFromTextPayload, GenerateQuestionsResponse};
use crate::error::{Error, Result};
use crate::models::exam::ExamType;
use crate::routes::upload::{body_kind, read_form, validate_pdf, BodyKind};
use crate::utils::seed::generate_seed;
use crate::utils::text::strip_control_chars;
use crate::AppState;

/// `POST /api/generate-questions`: a PDF upload (multipart) or raw text
/// (JSON) in, a generated exam out.
pub async fn generate_questions(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<GenerateQuestionsResponse>> {
    if !state.ai_service.is_configured() {
        tracing::error!("Question generation requested without an LLM API key");
        return Err(Error::MissingApiKey);
    }

    let (exam_type, seed, content) = match body_kind(&req) {
        BodyKind::Multipart => {
            let mut form = read_form(req, &state, state.config.max_upload_bytes).await?;
            let file = form
                .pdf
                .take()
                .ok_or_else(|| Error::BadRequest("No file provided".to_string()))?;
            let upload = validate_pdf(file, state.config.max_upload_bytes)?;

            let exam_type = ExamType::from_form(form.field("examType"));
            let seed = form
                .field("randomSeed")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(generate_seed);

            tracing::info!(
                file = %upload.file_name,
                size = upload.bytes.len(),
                ?exam_type,
                %seed,
                "Processing uploaded PDF"
            );
            let content = state.extraction_service.exam_source_text(&upload).await;
            (exam_type, seed, content)
        }
        BodyKind::Json => {
            let Json(payload) = Json::<GenerateFromTextPayload>::from_request(req, &state)
                .await
                .map_err(|e| Error::BadRequest(e.body_text()))?;

            let cleaned = strip_control_chars(&payload.content);
            if cleaned.trim().is_empty() {
                return Err(Error::BadRequest("Content is required".to_string()));
            }

            let exam_type = ExamType::from_form(payload.exam_type.as_deref());
            let seed = payload.seed().unwrap_or_else(generate_seed);
            tracing::info!(chars = cleaned.len(), ?exam_type, %seed, "Processing text content");
            let content = state.extraction_service.prepare_for_prompt(&cleaned);
            (exam_type, seed, content)
        }
        BodyKind::Other => {
            return Err(Error::BadRequest("Invalid content type".to_string()));
        }
    };

    let output = state
        .generation_service
        .generate(exam_type, &content, &seed)
        .await?;

    tracing::info!(
        questions = output.questions.len(),
        source = ?output.source,
        attempts = output.attempts,
        "Exam ready"
    );

    Ok(Json(GenerateQuestionsResponse {
        questions: output.questions,
        source: output.source,
    }))
}
