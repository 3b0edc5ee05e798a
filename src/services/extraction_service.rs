use crate::config::{Config, ExtractionMode};
use crate::error::{Error, Result};
use crate::utils::text::{display_name_from_file, megabytes, normalize_whitespace, truncate_chars};
use bytes::Bytes;
use std::time::Duration;
use tokio::process::Command;

/// Extracted text shorter than this is treated as "no text at all".
const MIN_EXTRACTED_CHARS: usize = 10;
/// Source text shorter than this is replaced before prompting.
pub const MIN_SOURCE_CHARS: usize = 30;

pub const GENERIC_SOURCE_TEXT: &str = "\
The PDF document was uploaded and processed successfully.

Educational content is available to generate questions on topics such as:
- Fundamental concepts and important theories
- Practical applications and relevant examples
- Key definitions and specialized terminology
- Processes, methods and procedures
- Cause and effect relationships and comparisons
- Critical analysis and evaluation of information

Questions will be adapted to the selected exam type.";

pub const DEMO_SOURCE_TEXT: &str = "\
The system is running in demonstration mode.

Sample educational content covering:
- Natural sciences: photosynthesis and fundamental biological processes
- Biology: classification of mammals and their distinguishing traits
- History: major events of the twentieth century such as the Second World War
- Technology: programming languages such as JavaScript and their uses
- Physics: properties of matter such as boiling points and changes of state
- Chemistry: chemical reactions and transformation processes

This content allows valid educational questions to be generated for demonstration.";

#[derive(Debug, Clone)]
pub struct PdfUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Clone)]
pub struct ExtractionService {
    mode: ExtractionMode,
    pdftotext_path: String,
    timeout: Duration,
    max_content_chars: usize,
}

impl ExtractionService {
    pub fn new(config: &Config) -> Self {
        Self {
            mode: config.extraction_mode,
            pdftotext_path: config.pdftotext_path.clone(),
            timeout: Duration::from_secs(config.extraction_timeout_secs),
            max_content_chars: config.max_content_chars,
        }
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    /// Real extraction: `pdftotext` first, then the in-process parser.
    pub async fn extract_text(&self, bytes: &Bytes) -> Result<String> {
        let raw = match self.run_pdftotext(bytes).await {
            Ok(text) if text.trim().chars().count() >= MIN_EXTRACTED_CHARS => text,
            Ok(_) => {
                tracing::info!("pdftotext produced no usable text, trying pdf-extract");
                self.run_pdf_extract(bytes).await?
            }
            Err(e) => {
                tracing::warn!(error = %e, "pdftotext failed, trying pdf-extract");
                self.run_pdf_extract(bytes).await?
            }
        };

        let text = mark_pages(&raw);
        if text.trim().chars().count() < MIN_EXTRACTED_CHARS {
            return Err(Error::Extraction(
                "No text could be extracted from the PDF".to_string(),
            ));
        }
        tracing::info!(chars = text.len(), "PDF text extracted");
        Ok(text)
    }

    /// Text to build an exam from. Never fails: falls back to synthetic or
    /// sample content so generation can always proceed.
    pub async fn exam_source_text(&self, upload: &PdfUpload) -> String {
        let raw = match self.mode {
            ExtractionMode::Placeholder => {
                tracing::info!(file = %upload.file_name, "Placeholder mode, skipping extraction");
                placeholder_from_metadata(&upload.file_name, upload.bytes.len())
            }
            ExtractionMode::Native => match self.extract_text(&upload.bytes).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, file = %upload.file_name, "PDF extraction failed, using demo content");
                    DEMO_SOURCE_TEXT.to_string()
                }
            },
        };

        let raw = if raw.trim().chars().count() < MIN_SOURCE_CHARS {
            tracing::warn!("Extracted text too short, using generic content");
            GENERIC_SOURCE_TEXT.to_string()
        } else {
            raw
        };

        self.prepare_for_prompt(&raw)
    }

    pub fn prepare_for_prompt(&self, text: &str) -> String {
        truncate_chars(&normalize_whitespace(text), self.max_content_chars)
    }

    async fn run_pdftotext(&self, bytes: &Bytes) -> Result<String> {
        let temp = tempfile::Builder::new()
            .prefix("exam_upload_")
            .suffix(".pdf")
            .tempfile()?;
        tokio::fs::write(temp.path(), bytes).await?;

        let output = Command::new(&self.pdftotext_path)
            .arg("-layout")
            .arg(temp.path())
            .arg("-")
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| Error::Extraction("pdftotext timed out".to_string()))??;

        if !output.status.success() {
            return Err(Error::Extraction(format!(
                "pdftotext exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if !output.stderr.is_empty() {
            tracing::debug!(stderr = %String::from_utf8_lossy(&output.stderr), "pdftotext stderr");
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn run_pdf_extract(&self, bytes: &Bytes) -> Result<String> {
        let data = bytes.clone();
        let joined =
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data)).await;

        match joined {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(Error::Extraction(format!("pdf-extract failed: {}", e))),
            Err(e) => Err(Error::Internal(format!("pdf-extract task failed: {}", e))),
        }
    }
}

/// Rewrites form-feed page breaks into `--- Page N ---` headers, skipping
/// blank pages but keeping their numbers.
pub fn mark_pages(raw: &str) -> String {
    let mut out = String::new();
    for (idx, page) in raw.split('\u{c}').enumerate() {
        let page = page.trim();
        if page.is_empty() {
            continue;
        }
        out.push_str(&format!("\n--- Page {} ---\n{}\n", idx + 1, page));
    }
    out.trim().to_string()
}

pub fn placeholder_from_metadata(file_name: &str, size: usize) -> String {
    format!(
        "PDF document analyzed: \"{}\" ({}MB)

This document contains educational material on academic topics. The file was
processed successfully and questions will be generated from standard
educational content that includes:

- Fundamental concepts and important definitions
- Theoretical principles and practical applications
- Relationships between the elements of the topic
- Illustrative examples and case studies
- Conclusions and key points to remember

The generator will use these elements to build a complete, well structured
exam that assesses different levels of understanding.",
        display_name_from_file(file_name),
        megabytes(size)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(mode: ExtractionMode) -> ExtractionService {
        ExtractionService::new(&Config {
            extraction_mode: mode,
            pdftotext_path: "/nonexistent/bin/pdftotext".to_string(),
            max_content_chars: 200,
            ..Config::default()
        })
    }

    #[test]
    fn marks_pages_and_skips_blank_ones() {
        let raw = "First page text\u{c}   \u{c}Third page\u{c}";
        assert_eq!(
            mark_pages(raw),
            "--- Page 1 ---\nFirst page text\n\n--- Page 3 ---\nThird page"
        );
    }

    #[test]
    fn placeholder_mentions_name_and_size() {
        let text = placeholder_from_metadata("cell_biology-notes.pdf", 3 * 1024 * 1024);
        assert!(text.contains("\"cell biology notes\" (3.00MB)"));
    }

    #[test]
    fn placeholder_mode_never_touches_bytes() {
        let svc = service(ExtractionMode::Placeholder);
        let upload = PdfUpload {
            file_name: "history.pdf".to_string(),
            bytes: Bytes::from_static(b"not really a pdf"),
        };
        let text = tokio_test::block_on(svc.exam_source_text(&upload));
        assert!(text.starts_with("PDF document analyzed: \"history\""));
        assert!(text.chars().count() <= 200);
        assert!(!text.contains('\n'));
    }

    #[tokio::test]
    async fn native_mode_falls_back_to_demo_content() {
        let svc = service(ExtractionMode::Native);
        let upload = PdfUpload {
            file_name: "broken.pdf".to_string(),
            bytes: Bytes::from_static(b"%PDF-1.4 garbage that no parser accepts"),
        };
        let text = svc.exam_source_text(&upload).await;
        assert!(text.starts_with("The system is running in demonstration mode."));
    }

    #[tokio::test]
    async fn strict_extraction_reports_failure() {
        let svc = service(ExtractionMode::Native);
        let err = svc
            .extract_text(&Bytes::from_static(b"%PDF-1.4 garbage"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }
}
