use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub question_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_answer: Option<String>,
}

impl UserAnswer {
    pub fn text(&self) -> &str {
        self.text_answer.as_deref().unwrap_or("")
    }
}
