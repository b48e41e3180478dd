use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use link_preview::config::Config;
use link_preview::models::{PreviewOptions, PreviewRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    let app = Router::new()
        .route("/health", get(health))
        .route("/preview", post(preview_endpoint))
        .with_state(Arc::new(config));

    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn preview_endpoint(
    State(config): State<Arc<Config>>,
    Json(req): Json<PreviewRequest>,
) -> Response {
    if req.url.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "url must not be empty"})),
        )
            .into_response();
    }

    let options = config.apply(PreviewOptions::from(req));
    let result = link_preview::get_preview(options).await;
    (StatusCode::OK, Json(result)).into_response()
}
