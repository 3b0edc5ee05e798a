mod common;

use axum::{body::Body, http::{header, Request, StatusCode}};
use common::{
    app, development_reply, json_request, mc_reply, multipart_request, pdf_part, send,
    test_config, FakeLlm, Part, Reply, SAMPLE_PDF,
};
use serde_json::json;

const URI: &str = "/api/generate-questions";

#[tokio::test]
async fn generates_test_exam_from_pdf() {
    let llm = FakeLlm::start(vec![Reply::Content(mc_reply(20))]).await;
    let app = app(test_config(&llm.base_url));

    let req = multipart_request(
        URI,
        &[
            pdf_part(SAMPLE_PDF),
            Part::Text("examType", "test"),
            Part::Text("randomSeed", "12345"),
        ],
    );
    let (status, body) = send(app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "llm");
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 20);
    assert_eq!(questions[0]["type"], "multiple-choice");
    assert_eq!(questions[0]["correctAnswer"], 2);
    assert_eq!(questions[19]["id"], 20);

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["model"], "llama-3.3-70b-versatile");
    assert_eq!(requests[0]["response_format"]["type"], "json_object");
    let prompt = llm.prompt(0);
    assert!(prompt.contains("12345"));
    assert!(prompt.contains("\"cell biology\""));
    assert!(prompt.contains("exactly 20 multiple-choice"));
}

#[tokio::test]
async fn retries_malformed_reply_then_succeeds() {
    let fenced = format!("Here you go:\n```json\n{}\n```", development_reply(5));
    let llm = FakeLlm::start(vec![
        Reply::Content("Sorry, I cannot help with that.".to_string()),
        Reply::Content(fenced),
    ])
    .await;
    let app = app(test_config(&llm.base_url));

    let req = multipart_request(
        URI,
        &[pdf_part(SAMPLE_PDF), Part::Text("examType", "development")],
    );
    let (status, body) = send(app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "llm");
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 5);
    assert_eq!(questions[0]["type"], "development");
    assert_eq!(questions[0]["expectedAnswer"], "A thorough discussion.");
    assert!(questions[0].get("options").is_none());
    assert_eq!(llm.requests().len(), 2);
}

#[tokio::test]
async fn falls_back_after_three_failed_attempts() {
    let llm = FakeLlm::start(vec![
        Reply::Status(500),
        Reply::Content("definitely not json".to_string()),
        Reply::Content(json!({ "questions": [] }).to_string()),
    ])
    .await;
    let app = app(test_config(&llm.base_url));

    let req = multipart_request(URI, &[pdf_part(SAMPLE_PDF)]);
    let (status, body) = send(app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 20);
    assert_eq!(questions[0]["options"][0], "First answer option");
    assert_eq!(questions[0]["correctAnswer"], 0);
    assert_eq!(llm.requests().len(), 3);
}

#[tokio::test]
async fn shuffled_options_keep_the_correct_answer() {
    let llm = FakeLlm::start(vec![Reply::Content(mc_reply(20))]).await;
    let mut config = test_config(&llm.base_url);
    config.shuffle_options = true;

    let req = multipart_request(
        URI,
        &[pdf_part(SAMPLE_PDF), Part::Text("randomSeed", "7")],
    );
    let (status, body) = send(app(config), req).await;

    assert_eq!(status, StatusCode::OK);
    for q in body["questions"].as_array().unwrap() {
        let idx = q["correctAnswer"].as_u64().unwrap() as usize;
        assert_eq!(q["options"][idx], "Gamma");
    }
}

#[tokio::test]
async fn rejects_request_without_file() {
    let llm = FakeLlm::start(vec![]).await;
    let req = multipart_request(URI, &[Part::Text("examType", "test")]);
    let (status, body) = send(app(test_config(&llm.base_url)), req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file provided");
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn rejects_non_pdf_upload() {
    let llm = FakeLlm::start(vec![]).await;
    let req = multipart_request(
        URI,
        &[Part::File {
            name: "pdf",
            file_name: "notes.txt",
            content_type: "text/plain",
            data: b"just some notes",
        }],
    );
    let (status, body) = send(app(test_config(&llm.base_url)), req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Only PDF files are allowed");
    assert_eq!(body["fileType"], "text/plain");
}

#[tokio::test]
async fn rejects_oversized_upload() {
    let llm = FakeLlm::start(vec![]).await;
    let mut config = test_config(&llm.base_url);
    config.max_upload_bytes = 64;

    let mut data = SAMPLE_PDF.to_vec();
    data.extend(std::iter::repeat(b'x').take(200));
    let req = multipart_request(URI, &[pdf_part(&data)]);
    let (status, body) = send(app(config), req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("File too large"));
    assert_eq!(body["fileSize"], "0.00MB");
}

#[tokio::test]
async fn rejects_upload_far_beyond_the_limit_with_file_size() {
    let llm = FakeLlm::start(vec![]).await;

    let mut data = SAMPLE_PDF.to_vec();
    data.resize(12 * 1024 * 1024, b'x');
    let req = multipart_request(URI, &[pdf_part(&data), Part::Text("examType", "test")]);
    let (status, body) = send(app(test_config(&llm.base_url)), req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "File too large. Maximum size is 10.00MB.");
    assert_eq!(body["fileSize"], "12.00MB");
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn declared_content_length_is_checked_before_reading() {
    let llm = FakeLlm::start(vec![]).await;
    let mut config = test_config(&llm.base_url);
    config.max_upload_bytes = 1024;

    let mut req = multipart_request(URI, &[pdf_part(SAMPLE_PDF)]);
    req.headers_mut().insert(
        header::CONTENT_LENGTH,
        (3 * 1024 * 1024).to_string().parse().unwrap(),
    );
    let (status, body) = send(app(config), req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fileSize"], "3.00MB");
}

#[tokio::test]
async fn rejects_unsupported_content_type() {
    let llm = FakeLlm::start(vec![]).await;
    let req = Request::builder()
        .method("POST")
        .uri(URI)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("hello"))
        .unwrap();
    let (status, body) = send(app(test_config(&llm.base_url)), req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid content type");
}

#[tokio::test]
async fn missing_api_key_returns_instructions() {
    let llm = FakeLlm::start(vec![]).await;
    let mut config = test_config(&llm.base_url);
    config.llm_api_key = None;

    let req = multipart_request(URI, &[pdf_part(SAMPLE_PDF)]);
    let (status, body) = send(app(config), req).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "LLM API key not configured");
    assert!(body["instructions"].as_str().unwrap().contains("LLM_API_KEY"));
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn generates_from_json_content() {
    let llm = FakeLlm::start(vec![Reply::Content(development_reply(5))]).await;
    let req = json_request(
        URI,
        json!({
            "content": "Photosynthesis converts light\u{0007} into chemical energy.",
            "examType": "development",
            "randomSeed": 42
        }),
    );
    let (status, body) = send(app(test_config(&llm.base_url)), req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["questions"].as_array().unwrap().len(), 5);
    let prompt = llm.prompt(0);
    assert!(prompt.contains("Photosynthesis converts light into chemical energy."));
    assert!(prompt.contains("random seed to vary the questions: 42"));
    assert!(prompt.contains("exactly 5 open-ended"));
}

#[tokio::test]
async fn json_content_is_required() {
    let llm = FakeLlm::start(vec![]).await;
    let req = json_request(URI, json!({ "content": "  \u{0001} " }));
    let (status, body) = send(app(test_config(&llm.base_url)), req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Content is required");
}
