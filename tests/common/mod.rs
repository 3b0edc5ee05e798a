#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use exam_forge::config::{Config, ExtractionMode};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

pub const BOUNDARY: &str = "exam-forge-test-boundary";

/// One scripted answer from the fake provider.
#[derive(Clone, Debug)]
pub enum Reply {
    Content(String),
    Status(u16),
}

#[derive(Default)]
struct Script {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<JsonValue>>,
}

/// OpenAI-compatible chat-completions server bound to a random local port.
/// Replies are consumed in order; once exhausted every call gets a 500.
pub struct FakeLlm {
    pub base_url: String,
    script: Arc<Script>,
}

impl FakeLlm {
    pub async fn start(replies: Vec<Reply>) -> Self {
        let script = Arc::new(Script {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(script.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake llm");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake llm server");
        });

        Self {
            base_url: format!("http://{}/v1", addr),
            script,
        }
    }

    pub fn requests(&self) -> Vec<JsonValue> {
        self.script.requests.lock().unwrap().clone()
    }

    pub fn prompt(&self, index: usize) -> String {
        self.requests()[index]["messages"][0]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }
}

async fn completions(State(script): State<Arc<Script>>, Json(body): Json<JsonValue>) -> Response {
    script.requests.lock().unwrap().push(body);
    let next = script.replies.lock().unwrap().pop_front();
    match next {
        Some(Reply::Content(content)) => Json(json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        }))
        .into_response(),
        Some(Reply::Status(code)) => (
            StatusCode::from_u16(code).unwrap(),
            Json(json!({ "error": { "message": "scripted failure" } })),
        )
            .into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "no scripted reply").into_response(),
    }
}

pub fn test_config(llm_base_url: &str) -> Config {
    Config {
        llm_api_key: Some("test-key".to_string()),
        llm_base_url: llm_base_url.to_string(),
        llm_timeout_secs: 5,
        extraction_mode: ExtractionMode::Placeholder,
        retry_backoff_ms: 0,
        public_rps: 1000,
        ..Config::default()
    }
}

pub fn app(config: Config) -> Router {
    exam_forge::build_router(exam_forge::AppState::new(config).expect("app state"))
}

pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, JsonValue) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, body)
}

pub fn json_request(uri: &str, body: JsonValue) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

pub fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn pdf_part<'a>(data: &'a [u8]) -> Part<'a> {
    Part::File {
        name: "pdf",
        file_name: "cell_biology.pdf",
        content_type: "application/pdf",
        data,
    }
}

pub const SAMPLE_PDF: &[u8] = b"%PDF-1.4\n% sample upload used by the tests\n";

/// A well-formed multiple-choice reply with `count` questions.
pub fn mc_reply(count: usize) -> String {
    let questions: Vec<JsonValue> = (1..=count)
        .map(|i| {
            json!({
                "id": i,
                "question": format!("Question {}?", i),
                "options": ["Alpha", "Beta", "Gamma", "Delta"],
                "correctAnswer": 2,
                "explanation": "Gamma is right.",
                "type": "multiple-choice"
            })
        })
        .collect();
    json!({ "questions": questions }).to_string()
}

pub fn development_reply(count: usize) -> String {
    let questions: Vec<JsonValue> = (1..=count)
        .map(|i| {
            json!({
                "id": i,
                "question": format!("Discuss topic {}.", i),
                "expectedAnswer": "A thorough discussion.",
                "explanation": "Covers causes and effects.",
                "type": "development"
            })
        })
        .collect();
    json!({ "questions": questions }).to_string()
}
