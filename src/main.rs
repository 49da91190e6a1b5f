/// API сервер пайплайна

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

use wine_pipeline::api::{self, AppState};
use wine_pipeline::PipelineConfig;

const DEFAULT_ADDR: &str = "0.0.0.0:8000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match std::env::var_os("WINE_PIPELINE_CONFIG").map(PathBuf::from) {
        Some(path) => PipelineConfig::from_json_file(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let addr: SocketAddr = std::env::var("WINE_PIPELINE_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()
        .context("WINE_PIPELINE_ADDR is not a socket address")?;

    let app = api::router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
