use serde::{Deserialize, Serialize};

use super::question::QuestionType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExamType {
    Test,
    Development,
}

impl ExamType {
    /// `"test"` selects multiple choice; every other value is treated as an
    /// open-ended exam.
    pub fn from_form(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => ExamType::Test,
            Some(v) if v.eq_ignore_ascii_case("test") => ExamType::Test,
            Some(_) => ExamType::Development,
        }
    }

    pub fn question_count(self) -> usize {
        match self {
            ExamType::Test => 20,
            ExamType::Development => 5,
        }
    }

    pub fn question_type(self) -> QuestionType {
        match self {
            ExamType::Test => QuestionType::MultipleChoice,
            ExamType::Development => QuestionType::Development,
        }
    }
}
