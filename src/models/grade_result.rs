use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradeResult {
    pub question_id: i32,
    pub is_correct: bool,
    pub user_answer: String,
    pub correct_answer: String,
    pub explanation: String,
    /// 0..=100. Multiple-choice questions only ever score 0 or 100.
    pub score: u8,
}
