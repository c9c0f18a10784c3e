//! HTTP API server for frontend integration.
//!
//! Provides REST endpoints to trigger audiobook generation and retrieve the
//! resulting audio by id.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{GenerationRequest, Orchestrator};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let state = Arc::new(AppState { orchestrator });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/generate", post(generate))
        .route("/download/{audio_id}", get(download))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Fortell API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Generate", "POST /generate");
    Output::kv("Download", "GET  /download/:audio_id");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct GenerateRequest {
    /// Topic of the audiobook
    topic: String,
    /// Audience expertise level
    expertise: String,
    /// Target narration length in minutes
    length: u32,
}

#[derive(Serialize)]
struct GenerateResponse {
    audio_id: String,
    status: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Trigger a generation run.
///
/// Responds only after the entire pipeline (including audio synthesis) has
/// finished. A failed run still gets a well-formed response body; the failure
/// is carried in the status field.
async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> impl IntoResponse {
    let request = GenerationRequest {
        topic: req.topic,
        expertise: req.expertise,
        length_minutes: req.length,
    };

    let handle = state.orchestrator.generate(&request).await;

    Json(GenerateResponse {
        audio_id: handle.id.to_string(),
        status: handle.status.to_string(),
    })
}

/// Serve the generated audio file for download/playback.
async fn download(
    State(state): State<Arc<AppState>>,
    Path(audio_id): Path<String>,
) -> impl IntoResponse {
    // Ids are UUIDs; anything else cannot name an artifact
    let id = match audio_id.parse::<Uuid>() {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Audio file not found or generation not complete.".to_string(),
                }),
            )
                .into_response();
        }
    };

    let path = state.orchestrator.artifact_path(id);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "audio/mpeg".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}.mp3\"", id),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Audio file not found or generation not complete.".to_string(),
            }),
        )
            .into_response(),
    }
}
