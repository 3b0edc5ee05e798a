use crate::config::{Config, ExtractionMode};
use crate::error::{Error, Result};
use crate::prompts::commentary_prompt;
use crate::services::ai_service::{AIService, ChatOptions};
use crate::services::extraction_service::{ExtractionService, PdfUpload, MIN_SOURCE_CHARS};
use crate::utils::time::now;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};

pub const MIN_TEXT_CHARS: usize = 50;
pub const MAX_TEXT_CHARS: usize = 8000;

const PASTE_SUGGESTION: &str = "Copy the text from the PDF and submit it as plain text instead.";

#[derive(Debug, Clone)]
pub struct Commentary {
    pub commentary: String,
    pub text_length: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct CommentaryService {
    ai: AIService,
    extraction: ExtractionService,
    language: String,
}

impl CommentaryService {
    pub fn new(config: &Config, ai: AIService, extraction: ExtractionService) -> Self {
        Self {
            ai,
            extraction,
            language: config.exam_language.clone(),
        }
    }

    pub fn ensure_configured(&self) -> Result<()> {
        if self.ai.is_configured() {
            Ok(())
        } else {
            Err(Error::MissingApiKey)
        }
    }

    /// Pulls the literary text out of an uploaded PDF. Unlike exam
    /// generation there is no synthetic fallback: a commentary on
    /// placeholder text is meaningless.
    pub async fn text_from_pdf(&self, upload: &PdfUpload) -> Result<String> {
        if self.extraction.mode() == ExtractionMode::Placeholder {
            return Err(Error::rejected(
                StatusCode::BAD_REQUEST,
                "PDF processing is not available on this deployment",
            )
            .with("suggestion", PASTE_SUGGESTION));
        }

        let text = match self.extraction.extract_text(&upload.bytes).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, file = %upload.file_name, "Commentary PDF extraction failed");
                return Err(Error::rejected(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error processing the PDF",
                )
                .with("suggestion", PASTE_SUGGESTION));
            }
        };

        if text.trim().chars().count() < MIN_SOURCE_CHARS {
            return Err(Error::rejected(
                StatusCode::BAD_REQUEST,
                "Not enough text could be extracted from the PDF",
            )
            .with(
                "suggestion",
                "The PDF may be empty, scanned or use non-selectable text. Copy the text manually and submit it as plain text.",
            ));
        }
        Ok(text)
    }

    pub async fn comment(&self, text: &str) -> Result<Commentary> {
        self.ensure_configured()?;
        check_length(text)?;

        let text_length = text.chars().count();
        tracing::info!(text_length, "Generating literary commentary");

        let prompt = commentary_prompt(text, &self.language);
        let commentary = self
            .ai
            .chat(&prompt, ChatOptions::COMMENTARY)
            .await
            .map_err(|e| match e {
                Error::Upstream(details) => Error::rejected(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error while generating the literary commentary",
                )
                .with("details", details),
                other => other,
            })?;

        tracing::info!(chars = commentary.len(), "Literary commentary generated");
        Ok(Commentary {
            commentary: commentary.trim().to_string(),
            text_length,
            generated_at: now(),
        })
    }
}

pub fn check_length(text: &str) -> Result<()> {
    let trimmed = text.trim().chars().count();
    if trimmed == 0 {
        return Err(Error::BadRequest(
            "No text provided for literary commentary".to_string(),
        ));
    }
    if trimmed < MIN_TEXT_CHARS {
        return Err(Error::BadRequest(format!(
            "The text must be at least {} characters long to produce a meaningful commentary",
            MIN_TEXT_CHARS
        )));
    }
    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(Error::BadRequest(format!(
            "The text is too long. Maximum {} characters.",
            MAX_TEXT_CHARS
        )));
    }
    Ok(())
}
