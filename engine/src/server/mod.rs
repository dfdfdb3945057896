//! HTTP intake
//!
//! # Endpoints
//!
//! - POST /api/ - Answer a question (multipart: `question`, optional `file`)
//! - GET /api/status - Server status
//! - GET / - Liveness banner
//!
//! Every accepted question gets `200 {"answer": ...}`. Only a missing
//! question, a disallowed upload or a malformed form produce an error status.
//! An upload that cannot be saved is reported in the answer text.

mod error;
mod upload;

pub use error::ApiError;
pub use upload::{is_allowed_extension, sanitize_filename, save_upload, scratch_dir};

use crate::answer::Dispatcher;
use crate::config::Config;
use crate::extract;
use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use sdk::{AnswerResponse, EngineError, FileFacts, FileKind};
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

/// Banner returned by `GET /`
pub const INDEX_TEXT: &str = "API is running. Send POST requests to /api/ endpoint.";

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    allowed_extensions: Arc<Vec<String>>,
    scratch_root: Option<Arc<PathBuf>>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, config: &Config) -> Self {
        Self {
            dispatcher,
            allowed_extensions: Arc::new(config.server.allowed_extensions.clone()),
            scratch_root: config.server.scratch_dir.clone().map(Arc::new),
        }
    }
}

/// Build the router with the upload ceiling applied
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/", post(answer_handler))
        .route("/api/status", get(status_handler))
        .route("/", get(index_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: &Config) -> Result<(), EngineError> {
    let addr: SocketAddr = config.server.bind.parse().map_err(|e| {
        EngineError::Config(format!("Invalid bind address '{}': {}", config.server.bind, e))
    })?;

    let dispatcher = Arc::new(Dispatcher::from_config(config)?);
    if !dispatcher.has_model() {
        tracing::warn!("Serving without a completion client");
    }

    let app = router(
        AppState::new(dispatcher, config),
        config.server.max_upload_bytes,
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| EngineError::Network(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Solver listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Solver shutting down gracefully");
        })
        .await
        .map_err(|e| EngineError::Network(format!("Server error: {}", e)))
}

/// Fields read from the multipart form
struct AnswerForm {
    question: Option<String>,
    file: Option<(String, Vec<u8>)>,
}

/// Read the form, rejecting a disallowed file before its body is read
async fn read_form(
    mut multipart: Multipart,
    allowed_extensions: &[String],
) -> Result<AnswerForm, ApiError> {
    let mut form = AnswerForm {
        question: None,
        file: None,
    };

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("question") => {
                form.question = Some(field.text().await?);
            }
            Some("file") => {
                // An empty file part means no upload
                let Some(client_name) = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                else {
                    continue;
                };

                let file_name = sanitize_filename(&client_name);
                if !is_allowed_extension(&file_name, allowed_extensions) {
                    return Err(EngineError::FileTypeNotAllowed(client_name).into());
                }

                let bytes = field.bytes().await?;
                form.file = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Answer endpoint
async fn answer_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let multipart = multipart.map_err(|e| EngineError::InvalidUpload(e.body_text()))?;

    let form = read_form(multipart, &state.allowed_extensions).await?;

    let question = form
        .question
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or(EngineError::MissingQuestion)?;

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("answer", %request_id);

    let answer = answer_question(&state, &question, form.file)
        .instrument(span)
        .await;

    Ok(Json(AnswerResponse { answer }))
}

/// Save the upload, extract it and dispatch the question
async fn answer_question(
    state: &AppState,
    question: &str,
    file: Option<(String, Vec<u8>)>,
) -> String {
    // The scratch directory lives until the answer is ready
    let (facts, _scratch) = match file {
        Some((file_name, bytes)) => {
            let root = state.scratch_root.as_deref().map(PathBuf::as_path);
            match save_upload(root, &file_name, &bytes).await {
                Ok((scratch, path)) => {
                    tracing::info!(file = %file_name, size = bytes.len(), "Saved upload");
                    (Some(extract_blocking(path, file_name).await), Some(scratch))
                }
                Err(e) => {
                    tracing::error!(file = %file_name, error = %e, "Failed to save upload");
                    return format!("Error saving upload: {}", e);
                }
            }
        }
        None => (None, None),
    };

    let answer = state.dispatcher.answer(question, facts.as_ref()).await;
    tracing::info!(answer_len = answer.len(), "Answered question");
    answer
}

async fn extract_blocking(path: std::path::PathBuf, file_name: String) -> FileFacts {
    let fallback = (path.clone(), file_name.clone());
    match tokio::task::spawn_blocking(move || extract::extract(&path, &file_name)).await {
        Ok(facts) => facts,
        Err(e) => {
            tracing::error!(error = %e, "Extraction task failed");
            let (path, file_name) = fallback;
            let summary = format!("Error reading {}: extraction task failed", file_name);
            FileFacts::new(path, file_name, FileKind::Unknown, summary)
        }
    }
}

/// Server status endpoint
async fn status_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness banner
async fn index_handler() -> impl IntoResponse {
    (StatusCode::OK, INDEX_TEXT)
}
