//! In-process stand-in for the inference service used by unit tests

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// What the mock answers to `POST /predict`
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl MockReply {
    pub fn ok(body: &str) -> Self {
        Self::status(StatusCode::OK, body)
    }

    pub fn status(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// The multipart body of the last `/predict` call
#[derive(Debug, Clone, Default)]
pub struct ReceivedUpload {
    pub field_names: Vec<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
struct MockState {
    reply: Arc<MockReply>,
    hits: Arc<AtomicUsize>,
    last_upload: Arc<Mutex<Option<ReceivedUpload>>>,
}

pub struct MockInference {
    pub base_url: String,
    state: MockState,
}

impl MockInference {
    pub async fn start(reply: MockReply) -> Self {
        let state = MockState {
            reply: Arc::new(reply),
            hits: Arc::new(AtomicUsize::new(0)),
            last_upload: Arc::new(Mutex::new(None)),
        };

        let app = Router::new()
            .route("/predict", post(predict))
            .route("/ping", get(ping))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn last_upload(&self) -> Option<ReceivedUpload> {
        self.state.last_upload.lock().unwrap().clone()
    }
}

async fn predict(State(state): State<MockState>, mut multipart: Multipart) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let mut upload = ReceivedUpload::default();
    while let Some(field) = multipart.next_field().await.unwrap() {
        upload.field_names.push(field.name().unwrap_or_default().to_string());
        upload.file_name = field.file_name().map(str::to_string);
        upload.content_type = field.content_type().map(str::to_string);
        upload.bytes = field.bytes().await.unwrap().to_vec();
    }
    *state.last_upload.lock().unwrap() = Some(upload);

    tokio::time::sleep(state.reply.delay).await;

    (
        state.reply.status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        state.reply.body.clone(),
    )
}

async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Model API is alive and kicking!" }))
}
