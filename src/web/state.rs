//! Shared state for the web UI

use crate::classifier::{
    ClassifierError, ClassifierSession, ImageFile, InferenceClient, SessionSnapshot,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Application state shared across all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// The one classifier session behind the page
    pub session: Arc<RwLock<ClassifierSession>>,
    /// Client for the inference service
    pub client: InferenceClient,
}

impl AppState {
    pub fn new(client: InferenceClient) -> Self {
        Self {
            session: Arc::new(RwLock::new(ClassifierSession::new())),
            client,
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.read().await;
        session.snapshot(Utc::now())
    }

    pub async fn select_file(&self, file: ImageFile) -> Result<(), ClassifierError> {
        let mut session = self.session.write().await;
        session.select_file(file).map(|_| ())
    }

    /// Start a submission and run its request in the background.
    ///
    /// Returns `None` if the session refused to submit. The handle resolves
    /// to whether the outcome was applied or discarded as stale.
    pub async fn analyze(&self) -> Option<JoinHandle<bool>> {
        let ticket = {
            let mut session = self.session.write().await;
            session.submit()?
        };

        let client = self.client.clone();
        let session = Arc::clone(&self.session);
        Some(tokio::spawn(async move {
            let outcome = client.predict(ticket.image).await;
            let mut session = session.write().await;
            session.complete(ticket.generation, outcome)
        }))
    }

    pub async fn reset(&self) {
        let mut session = self.session.write().await;
        session.reset();
    }

    /// Copy of the image behind a live preview id
    pub async fn preview(&self, id: Uuid) -> Option<ImageFile> {
        let session = self.session.read().await;
        session.preview(id).cloned()
    }
}
