use crate::models::answer::UserAnswer;
use crate::models::grade_result::GradeResult;
use crate::models::question::Question;
use crate::services::generation_service::QuestionSource;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

/// JSON alternative to the PDF upload: raw study material as text.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFromTextPayload {
    #[serde(default)]
    pub content: String,
    pub exam_type: Option<String>,
    /// Browsers send `Date.now()`, so numbers are accepted as well.
    pub random_seed: Option<JsonValue>,
}

impl GenerateFromTextPayload {
    pub fn seed(&self) -> Option<String> {
        match self.random_seed.as_ref()? {
            JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateQuestionsResponse {
    pub questions: Vec<Question>,
    pub source: QuestionSource,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GradeExamRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "At least one question is required"))]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub user_answers: Vec<UserAnswer>,
}

#[derive(Debug, Serialize)]
pub struct GradeExamResponse {
    pub results: Vec<GradeResult>,
}
