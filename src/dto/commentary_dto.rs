use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CommentaryPayload {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CommentaryResponse {
    pub commentary: String,
    pub metadata: CommentaryMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentaryMetadata {
    pub text_length: usize,
    pub generated_at: String,
}
