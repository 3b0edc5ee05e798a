use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Map, Value as JsonValue};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A request rejected with extra hint fields merged into the JSON body.
    #[error("{message}")]
    Rejected {
        status: StatusCode,
        message: String,
        extra: Map<String, JsonValue>,
    },

    #[error("LLM API key not configured")]
    MissingApiKey,

    #[error("LLM rate limit reached")]
    RateLimited,

    #[error("LLM request timed out")]
    Timeout,

    #[error("LLM provider error: {0}")]
    Upstream(String),

    #[error("LLM returned an empty completion")]
    EmptyCompletion,

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl Error {
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        Error::Rejected {
            status,
            message: message.into(),
            extra: Map::new(),
        }
    }

    /// Adds a field next to `error` in the response body.
    pub fn with(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        if let Error::Rejected { ref mut extra, .. } = self {
            extra.insert(key.to_string(), value.into());
        }
        self
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
            Error::RateLimited
        } else {
            Error::Upstream(err.to_string())
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message, extra) = match self {
            Error::Rejected {
                status,
                message,
                extra,
            } => (status, message, extra),
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, Map::new()),
            Error::MissingApiKey => {
                let mut extra = Map::new();
                extra.insert(
                    "instructions".into(),
                    json!("Set LLM_API_KEY (or GROQ_API_KEY) in the environment or in .env"),
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM API key not configured".to_string(),
                    extra,
                )
            }
            Error::RateLimited => {
                let mut extra = Map::new();
                extra.insert("retryAfter".into(), json!(60));
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "Rate limit reached. Please wait a few minutes before trying again.".to_string(),
                    extra,
                )
            }
            Error::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                "The server took too long to respond. Please try again.".to_string(),
                Map::new(),
            ),
            Error::Upstream(msg) => (
                StatusCode::BAD_GATEWAY,
                format!("External service error: {}", msg),
                Map::new(),
            ),
            Error::EmptyCompletion => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "The LLM returned an empty response".to_string(),
                Map::new(),
            ),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string(), Map::new()),
            Error::Json(err) => (StatusCode::BAD_REQUEST, err.to_string(), Map::new()),
            Error::Multipart(err) => (StatusCode::BAD_REQUEST, err.to_string(), Map::new()),
            Error::Extraction(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, Map::new()),
            Error::Io(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), Map::new()),
            err @ (Error::Config(_) | Error::Internal(_)) => {
                tracing::error!(error = %err, "Unexpected server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                    Map::new(),
                )
            }
        };

        let mut body = Map::new();
        body.insert("error".into(), JsonValue::String(error_message));
        body.extend(extra);
        (status, Json(JsonValue::Object(body))).into_response()
    }
}
