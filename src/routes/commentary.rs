use axum::extract::{FromRequest, Request, State};
use axum::Json;

use crate::dto::commentary_dto::{CommentaryMetadata, CommentaryPayload, CommentaryResponse};
use crate::error::{Error, Result};
use crate::routes::upload::{body_kind, read_form, validate_pdf, BodyKind};
use crate::utils::time::to_rfc3339;
use crate::AppState;

/// `POST /api/literary-commentary`: literary text as JSON or inside a PDF.
pub async fn literary_commentary(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<CommentaryResponse>> {
    let service = &state.commentary_service;
    service.ensure_configured()?;

    let text = match body_kind(&req) {
        BodyKind::Multipart => {
            let mut form = read_form(req, &state, state.config.max_upload_bytes).await?;
            let file = form
                .pdf
                .take()
                .ok_or_else(|| Error::BadRequest("No PDF file provided".to_string()))?;
            let upload = validate_pdf(file, state.config.max_upload_bytes)?;
            tracing::info!(file = %upload.file_name, size = upload.bytes.len(), "Extracting commentary text");
            service.text_from_pdf(&upload).await?
        }
        BodyKind::Json => {
            let Json(payload) = Json::<CommentaryPayload>::from_request(req, &state)
                .await
                .map_err(|e| Error::BadRequest(e.body_text()))?;
            payload.text
        }
        BodyKind::Other => {
            return Err(Error::BadRequest("Invalid content type".to_string()));
        }
    };

    let result = service.comment(&text).await.map_err(|e| {
        tracing::error!(error = %e, "Literary commentary failed");
        e
    })?;

    Ok(Json(CommentaryResponse {
        commentary: result.commentary,
        metadata: CommentaryMetadata {
            text_length: result.text_length,
            generated_at: to_rfc3339(result.generated_at),
        },
    }))
}
