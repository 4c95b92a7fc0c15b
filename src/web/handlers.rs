//! HTTP handlers for the web UI

use askama::Template;
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use super::state::AppState;
use crate::classifier::{ImageFile, SessionSnapshot, FILE_FIELD};

/// Errors a handler can return to the browser
#[derive(Error, Debug)]
pub enum WebError {
    #[error("Failed to render page: {0}")]
    Template(#[from] askama::Error),
    #[error("Failed to read upload: {0}")]
    Upload(#[from] MultipartError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WebError::Upload(e) => e.status(),
        };
        error!("{}", self);
        (status, self.to_string()).into_response()
    }
}

/// The classifier page
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub snapshot: SessionSnapshot,
    pub endpoint: String,
}

/// Inference service reachability as seen from the UI server
#[derive(Debug, Serialize)]
pub struct InferenceHealth {
    pub base_url: String,
    pub reachable: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub checked_at: String,
    pub inference: InferenceHealth,
}

// ============================================================================
// Page Handlers (HTML)
// ============================================================================

/// Render the page from the current session
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, WebError> {
    let page = IndexTemplate {
        snapshot: state.snapshot().await,
        endpoint: state.client.base_url().to_string(),
    };
    Ok(Html(page.render()?))
}

/// Drop target and file picker both post here
pub async fn select_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, WebError> {
    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let media_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await?.to_vec();
        file = Some(ImageFile::new(file_name, media_type, bytes));
        break;
    }

    // A form without a file is treated like a non-image selection
    let file = file.unwrap_or_else(|| ImageFile::new("", "", Vec::new()));
    if let Err(e) = state.select_file(file).await {
        debug!("Selection rejected: {}", e);
    }

    Ok(Redirect::to("/"))
}

/// The "Analyze" action
pub async fn analyze(State(state): State<AppState>) -> Redirect {
    if state.analyze().await.is_none() {
        debug!("Analyze ignored: no image selected or submission in flight");
    }
    Redirect::to("/")
}

/// The "New Image" action
pub async fn reset(State(state): State<AppState>) -> Redirect {
    state.reset().await;
    Redirect::to("/")
}

/// Serve the bytes behind a live preview reference
pub async fn preview(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.preview(id).await {
        Some(image) => ([(header::CONTENT_TYPE, image.media_type)], image.bytes).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

// ============================================================================
// API Handlers (JSON)
// ============================================================================

/// Current session as JSON
pub async fn api_state(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.snapshot().await)
}

/// Health check endpoint, including the inference service's `/ping`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let inference = match state.client.ping().await {
        Ok(message) => InferenceHealth {
            base_url: state.client.base_url().to_string(),
            reachable: true,
            message: Some(message),
            error: None,
        },
        Err(e) => InferenceHealth {
            base_url: state.client.base_url().to_string(),
            reachable: false,
            message: None,
            error: Some(e.to_string()),
        },
    };

    Json(HealthResponse {
        status: "healthy",
        service: "blightcheck-ui",
        checked_at: Utc::now().to_rfc3339(),
        inference,
    })
}
