pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod prompts;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    routing::{get, post},
    Router,
};
use reqwest::Client;
use tower_http::{services::ServeDir, trace::TraceLayer};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::middleware::{cors::api_cors, rate_limit};
use crate::routes::upload::MULTIPART_OVERHEAD;
use crate::services::{
    ai_service::AIService, commentary_service::CommentaryService,
    extraction_service::ExtractionService, generation_service::GenerationService,
    grading_service::GradingService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ai_service: AIService,
    pub extraction_service: ExtractionService,
    pub generation_service: GenerationService,
    pub grading_service: GradingService,
    pub commentary_service: CommentaryService,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        let ai_service = AIService::new(&config, http_client);
        let extraction_service = ExtractionService::new(&config);
        let generation_service = GenerationService::new(&config, ai_service.clone());
        let grading_service = GradingService::new(&config, ai_service.clone());
        let commentary_service =
            CommentaryService::new(&config, ai_service.clone(), extraction_service.clone());

        Ok(Self {
            config: Arc::new(config),
            ai_service,
            extraction_service,
            generation_service,
            grading_service,
            commentary_service,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let base_routes = Router::new()
        .route("/", get(routes::health::index))
        .route("/health", get(routes::health::health))
        .route("/api/health", get(routes::health::health));

    let exam_api = Router::new()
        .route(
            "/api/generate-questions",
            post(routes::generate::generate_questions),
        )
        .route("/api/grade-exam", post(routes::grade::grade_exam))
        .route(
            "/api/literary-commentary",
            post(routes::commentary::literary_commentary),
        )
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::RequestBudget::new(config.public_rps),
            rate_limit::request_budget_middleware,
        ));

    let mut app = base_routes.merge(exam_api);
    if let Some(dir) = &config.static_dir {
        tracing::info!("Serving static client from: {}", dir);
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.with_state(state)
        .layer(api_cors())
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "http",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %Uuid::new_v4(),
                )
            }),
        )
        .layer(DefaultBodyLimit::max(
            config.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD),
        ))
}
