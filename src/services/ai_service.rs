use crate::config::Config;
use crate::error::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider for a `json_object` response format.
    pub json_mode: bool,
}

impl ChatOptions {
    pub const GENERATION: ChatOptions = ChatOptions {
        temperature: 0.7,
        max_tokens: 4000,
        json_mode: true,
    };
    pub const GRADING: ChatOptions = ChatOptions {
        temperature: 0.3,
        max_tokens: 1000,
        json_mode: true,
    };
    pub const COMMENTARY: ChatOptions = ChatOptions {
        temperature: 0.7,
        max_tokens: 2000,
        json_mode: false,
    };
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    r#type: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
    messages: Vec<Msg<'a>>,
}

#[derive(Deserialize)]
struct RespChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct RespChoice {
    message: RespChoiceMsg,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    choices: Vec<RespChoice>,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct AIService {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl AIService {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            api_key: config.llm_api_key.clone(),
            base_url: config.llm_base_url.trim_end_matches('/').to_string(),
            model: config.llm_model.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends a single user turn and returns the first choice's text.
    pub async fn chat(&self, prompt: &str, options: ChatOptions) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(Error::MissingApiKey)?;

        let req = Req {
            model: &self.model,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: options.json_mode.then_some(ResponseFormat {
                r#type: "json_object",
            }),
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&req)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %text, model = %self.model, "LLM request rejected");
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => Error::RateLimited,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Error::Upstream(format!("API key rejected by provider ({})", status))
                }
                StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Error::Timeout,
                _ => Error::Upstream(format!("{}: {}", status, text)),
            });
        }

        let body: Resp = res.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(Error::EmptyCompletion)?;

        tracing::debug!(chars = content.len(), model = %self.model, "LLM completion received");
        Ok(content)
    }
}
