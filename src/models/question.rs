use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub id: i32,
    pub question: String,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<i32>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_answer: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QuestionType {
    #[serde(rename = "multiple-choice", alias = "multiple_choice")]
    MultipleChoice,
    /// Open-ended question answered in free text.
    #[serde(rename = "development", alias = "open-ended")]
    Development,
    #[serde(other)]
    Unknown,
}

impl Default for QuestionType {
    fn default() -> Self {
        QuestionType::Unknown
    }
}

impl Question {
    pub fn multiple_choice(
        id: i32,
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: i32,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            id,
            question: question.into(),
            question_type: QuestionType::MultipleChoice,
            options: Some(options),
            correct_answer: Some(correct_answer),
            explanation: explanation.into(),
            expected_answer: None,
        }
    }

    pub fn development(
        id: i32,
        question: impl Into<String>,
        expected_answer: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            id,
            question: question.into(),
            question_type: QuestionType::Development,
            options: None,
            correct_answer: None,
            explanation: explanation.into(),
            expected_answer: Some(expected_answer.into()),
        }
    }

    /// Option text at `index`, if the question has one there.
    pub fn option(&self, index: i32) -> Option<&str> {
        let idx = usize::try_from(index).ok()?;
        self.options.as_ref()?.get(idx).map(String::as_str)
    }
}
