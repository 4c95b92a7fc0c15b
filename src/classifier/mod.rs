//! Potato leaf classification client
//!
//! - `session`: the interaction state machine behind the page
//! - `client`: the HTTP client for the inference service
//! - `types`: classification results and their display helpers

mod client;
mod error;
mod session;
mod types;

pub use client::{InferenceClient, FILE_FIELD};
pub use error::ClassifierError;
pub use session::{ClassifierSession, ImageFile, SessionSnapshot, SubmissionState};
pub use types::{ClassificationResult, ConfidenceBadge, ConfidenceTier, Diagnosis};
