use std::collections::HashMap;

use axum::body::HttpBody;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{header, StatusCode};
use bytes::{Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::services::extraction_service::PdfUpload;
use crate::utils::text::megabytes;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Room left above the upload limit for the other multipart fields and
/// boundaries. Bodies beyond `max_bytes + MULTIPART_OVERHEAD` are refused
/// from their declared length before any field is read.
pub const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// How the client sent the request body.
pub enum BodyKind {
    Multipart,
    Json,
    Other,
}

pub fn body_kind(req: &Request) -> BodyKind {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        BodyKind::Multipart
    } else if content_type.starts_with("application/json") {
        BodyKind::Json
    } else {
        BodyKind::Other
    }
}

#[derive(Debug)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: Option<String>,
    /// At most `max_bytes` of the upload; the rest is counted, not kept.
    pub bytes: Bytes,
    pub size: usize,
}

#[derive(Debug, Default)]
pub struct UploadForm {
    pub pdf: Option<FilePart>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

fn too_large(size: usize, max_bytes: usize) -> Error {
    Error::rejected(
        StatusCode::BAD_REQUEST,
        format!("File too large. Maximum size is {}MB.", megabytes(max_bytes)),
    )
    .with("fileSize", format!("{}MB", megabytes(size)))
}

/// Declared body size: the `Content-Length` header, or the exact size hint
/// of an in-memory body.
fn declared_length(req: &Request) -> Option<usize> {
    req.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<usize>().ok())
        .or_else(|| {
            req.body()
                .size_hint()
                .exact()
                .and_then(|n| usize::try_from(n).ok())
        })
}

/// Reads every multipart field: the `pdf` part as bytes, the rest as text.
/// The `pdf` part is read chunk by chunk and only its first `max_bytes` are
/// kept.
pub async fn read_form<S>(req: Request, state: &S, max_bytes: usize) -> Result<UploadForm>
where
    S: Send + Sync,
{
    if let Some(len) = declared_length(&req) {
        if len > max_bytes.saturating_add(MULTIPART_OVERHEAD) {
            tracing::warn!(content_length = len, "Rejected oversized request body");
            return Err(too_large(len, max_bytes));
        }
    }

    let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|e| Error::BadRequest(e.body_text()))?;

    let mut form = UploadForm::default();
    while let Some(mut field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to get next field: {}", e);
        Error::BadRequest(e.to_string())
    })? {
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name == "pdf" {
            let file_name = field.file_name().unwrap_or("document.pdf").to_string();
            let content_type = field.content_type().map(str::to_string);

            let mut buf = BytesMut::new();
            let mut size = 0usize;
            while let Some(chunk) = field.chunk().await? {
                size += chunk.len();
                if buf.len() < max_bytes {
                    let keep = chunk.len().min(max_bytes - buf.len());
                    buf.extend_from_slice(&chunk[..keep]);
                }
            }

            form.pdf = Some(FilePart {
                file_name,
                content_type,
                bytes: buf.freeze(),
                size,
            });
        } else {
            let value = field.text().await?;
            form.fields.insert(field_name, value);
        }
    }
    Ok(form)
}

/// Checks type and size. Either a PDF content type or a `.pdf` name is
/// enough for the declared type, but the bytes must start with `%PDF`.
pub fn validate_pdf(file: FilePart, max_bytes: usize) -> Result<PdfUpload> {
    let declared_pdf = file.content_type.as_deref() == Some("application/pdf")
        || file.file_name.to_ascii_lowercase().ends_with(".pdf");

    if !declared_pdf || !file.bytes.starts_with(PDF_MAGIC) {
        let file_type = file
            .content_type
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        tracing::warn!(file = %file.file_name, %file_type, "Rejected non-PDF upload");
        return Err(
            Error::rejected(StatusCode::BAD_REQUEST, "Only PDF files are allowed")
                .with("fileType", file_type),
        );
    }

    if file.size > max_bytes {
        tracing::warn!(file = %file.file_name, size = file.size, "Rejected oversized upload");
        return Err(too_large(file.size, max_bytes));
    }

    Ok(PdfUpload {
        file_name: file.file_name,
        bytes: file.bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(name: &str, content_type: Option<&str>, bytes: &'static [u8]) -> FilePart {
        FilePart {
            file_name: name.to_string(),
            content_type: content_type.map(str::to_string),
            bytes: Bytes::from_static(bytes),
            size: bytes.len(),
        }
    }

    #[test]
    fn accepts_pdf_by_type_or_extension() {
        assert!(validate_pdf(part("a.bin", Some("application/pdf"), b"%PDF-1.7"), 100).is_ok());
        assert!(validate_pdf(part("a.PDF", None, b"%PDF-1.7"), 100).is_ok());
    }

    #[test]
    fn rejects_wrong_type_or_magic() {
        let err = validate_pdf(part("a.txt", Some("text/plain"), b"%PDF-1.7"), 100).unwrap_err();
        match err {
            Error::Rejected { status, extra, .. } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(extra["fileType"], "text/plain");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(validate_pdf(part("a.pdf", Some("application/pdf"), b"hello"), 100).is_err());
    }

    #[test]
    fn rejects_oversized_files_with_size() {
        let err = validate_pdf(part("a.pdf", None, b"%PDF-1.7 0123456789"), 8).unwrap_err();
        match err {
            Error::Rejected { extra, message, .. } => {
                assert_eq!(extra["fileSize"], "0.00MB");
                assert!(message.starts_with("File too large"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
