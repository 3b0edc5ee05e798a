use std::net::SocketAddr;

use exam_forge::{
    build_router,
    config::{init_config, LogFormat},
    AppState,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = init_config()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("exam_forge=info,tower_http=info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    if !config.has_llm_key() {
        tracing::warn!("LLM_API_KEY is not set: generation will fail and grading falls back to the heuristic");
    }
    info!(
        model = %config.llm_model,
        extraction_mode = ?config.extraction_mode,
        language = %config.exam_language,
        "Configuration loaded"
    );

    let app_state = AppState::new(config.clone())?;
    let app = build_router(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
