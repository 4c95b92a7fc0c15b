//! Interaction state of the classifier page
//!
//! `ClassifierSession` owns everything the user sees: the selected image and
//! its preview, the submission state, the last result and the error banner.
//! It never performs I/O itself. `submit` hands out a `SubmissionTicket`, the
//! caller runs the request, and `complete` applies the outcome only if the
//! ticket is still current.

use super::{ClassificationResult, ClassifierError, ConfidenceBadge, ConfidenceTier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Shown when a non-image file is selected
pub const INVALID_IMAGE_MESSAGE: &str = "Please select a valid image file (JPG, PNG, JPEG)";

const PROGRESS_TICK_MS: i64 = 300;
const PROGRESS_STEP: i64 = 5;
const PROGRESS_CAP: u8 = 95;

/// A file picked or dropped by the user
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Build from raw bytes, taking the media type from the image's magic
    /// bytes. Unrecognised content gets `application/octet-stream`.
    pub fn sniffed(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let media_type = image::guess_format(&bytes)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream");
        Self::new(file_name, media_type, bytes)
    }

    pub fn is_image(&self) -> bool {
        image_media_type(&self.media_type).is_some()
    }
}

/// Parse `image/<subtype>` out of a media type, dropping parameters and
/// normalising case. Returns `None` for anything that is not an image type
/// or that would not survive as a multipart `Content-Type`.
fn image_media_type(raw: &str) -> Option<String> {
    let essence = raw.split(';').next()?.trim().to_ascii_lowercase();
    let subtype = essence.strip_prefix("image/")?;
    let valid = !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c));
    valid.then_some(essence)
}

/// Handle under which the current image preview is served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreviewRef(Uuid);

impl PreviewRef {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn id(&self) -> Uuid {
        self.0
    }

    pub fn url(&self) -> String {
        format!("/preview/{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct SelectedImage {
    pub file: ImageFile,
    pub preview: PreviewRef,
}

/// Lifecycle of the one submission a session may have
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionState::Idle => write!(f, "idle"),
            SubmissionState::Submitting => write!(f, "submitting"),
            SubmissionState::Succeeded => write!(f, "succeeded"),
            SubmissionState::Failed => write!(f, "failed"),
        }
    }
}

/// Everything needed to run one request outside the session lock
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    pub generation: u64,
    pub image: ImageFile,
}

#[derive(Debug, Clone, Default)]
pub struct ClassifierSession {
    image: Option<SelectedImage>,
    state: SubmissionState,
    result: Option<ClassificationResult>,
    error: Option<String>,
    generation: u64,
    submitted_at: Option<DateTime<Utc>>,
}

impl ClassifierSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn image(&self) -> Option<&SelectedImage> {
        self.image.as_ref()
    }

    pub fn result(&self) -> Option<&ClassificationResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the selected image.
    ///
    /// Non-image files only set the validation message; the previous image,
    /// result and state are left as they were.
    pub fn select_file(&mut self, mut file: ImageFile) -> Result<PreviewRef, ClassifierError> {
        let Some(media_type) = image_media_type(&file.media_type) else {
            warn!(
                "Rejected {:?} with media type {:?}",
                file.file_name, file.media_type
            );
            self.error = Some(INVALID_IMAGE_MESSAGE.to_string());
            return Err(ClassifierError::InvalidInput {
                media_type: file.media_type,
            });
        };
        file.media_type = media_type;

        if let Some(previous) = self.image.take() {
            debug!("Released preview {}", previous.preview.id());
        }

        let preview = PreviewRef::generate();
        info!(
            "Selected {} ({}, {} bytes)",
            file.file_name,
            file.media_type,
            file.bytes.len()
        );

        self.image = Some(SelectedImage { file, preview });
        self.result = None;
        self.error = None;
        self.enter_idle();

        Ok(preview)
    }

    /// Start a submission for the selected image.
    ///
    /// Returns `None` when there is nothing to submit or a submission is
    /// already in flight.
    pub fn submit(&mut self) -> Option<SubmissionTicket> {
        if self.state == SubmissionState::Submitting {
            debug!("Submission already in flight, ignoring submit");
            return None;
        }
        let image = self.image.as_ref()?.file.clone();

        self.generation += 1;
        self.state = SubmissionState::Submitting;
        self.error = None;
        self.result = None;
        self.submitted_at = Some(Utc::now());

        info!(
            "Submitting {} (generation {})",
            image.file_name, self.generation
        );

        Some(SubmissionTicket {
            generation: self.generation,
            image,
        })
    }

    /// Apply the outcome of the request issued for `generation`.
    ///
    /// Returns `false` when the outcome was discarded because the session
    /// has moved on since the ticket was issued.
    pub fn complete(
        &mut self,
        generation: u64,
        outcome: Result<ClassificationResult, ClassifierError>,
    ) -> bool {
        if generation != self.generation || self.state != SubmissionState::Submitting {
            debug!(
                "Discarding stale response for generation {} (current {}, state {})",
                generation, self.generation, self.state
            );
            return false;
        }

        self.submitted_at = None;
        match outcome {
            Ok(result) => {
                info!(
                    "Classified as {} ({:.3})",
                    result.label, result.confidence
                );
                self.result = Some(result);
                self.error = None;
                self.state = SubmissionState::Succeeded;
            }
            Err(err) => {
                warn!("Classification failed: {}", err);
                self.result = None;
                self.error = Some(format!("Classification failed: {}", err));
                self.state = SubmissionState::Failed;
            }
        }

        true
    }

    /// Drop the image, result and error and return to idle
    pub fn reset(&mut self) {
        if let Some(previous) = self.image.take() {
            debug!("Released preview {}", previous.preview.id());
        }
        self.result = None;
        self.error = None;
        self.enter_idle();
    }

    /// The current image if `id` is its live preview reference
    pub fn preview(&self, id: Uuid) -> Option<&ImageFile> {
        self.image
            .as_ref()
            .filter(|image| image.preview.id() == id)
            .map(|image| &image.file)
    }

    pub fn can_analyze(&self) -> bool {
        self.image.is_some() && self.state != SubmissionState::Submitting
    }

    pub fn can_reset(&self) -> bool {
        self.image.is_some() || self.result.is_some() || self.error.is_some()
    }

    /// Progress shown to the user at `now`
    pub fn progress(&self, now: DateTime<Utc>) -> u8 {
        match (self.state, self.submitted_at) {
            (SubmissionState::Submitting, Some(started)) => cosmetic_progress(now - started),
            (SubmissionState::Succeeded, _) => 100,
            _ => 0,
        }
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            file_name: self.image.as_ref().map(|i| i.file.file_name.clone()),
            preview_url: self.image.as_ref().map(|i| i.preview.url()),
            result: self.result.as_ref().map(ResultView::from),
            error: self.error.clone(),
            progress: self.progress(now),
            can_analyze: self.can_analyze(),
            can_reset: self.can_reset(),
        }
    }

    fn enter_idle(&mut self) {
        // Any in-flight response now belongs to an older generation
        self.generation += 1;
        self.state = SubmissionState::Idle;
        self.submitted_at = None;
    }
}

/// Purely presentational progress for an in-flight submission.
///
/// Advances 5 points per 300 ms and stops at 95; it says nothing about the
/// real transfer.
pub fn cosmetic_progress(elapsed: chrono::Duration) -> u8 {
    let ticks = elapsed.num_milliseconds().max(0) / PROGRESS_TICK_MS;
    ticks
        .saturating_mul(PROGRESS_STEP)
        .min(PROGRESS_CAP as i64) as u8
}

/// Serializable view of a session for the page and `/api/state`
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: SubmissionState,
    pub file_name: Option<String>,
    pub preview_url: Option<String>,
    pub result: Option<ResultView>,
    pub error: Option<String>,
    pub progress: u8,
    pub can_analyze: bool,
    pub can_reset: bool,
}

impl SessionSnapshot {
    pub fn is_submitting(&self) -> bool {
        self.state == SubmissionState::Submitting
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    pub label: String,
    pub confidence: f64,
    /// One decimal, e.g. "93.0"
    pub confidence_percent: String,
    pub tier: ConfidenceTier,
    pub badge: ConfidenceBadge,
    pub recommendation: String,
}

impl From<&ClassificationResult> for ResultView {
    fn from(result: &ClassificationResult) -> Self {
        ResultView {
            label: result.label.clone(),
            confidence: result.confidence,
            confidence_percent: format!("{:.1}", result.confidence_percent()),
            tier: result.tier(),
            badge: result.badge(),
            recommendation: result.recommendation().to_string(),
        }
    }
}

impl ResultView {
    pub fn tier_label(&self) -> String {
        self.tier.to_string()
    }

    pub fn badge_class(&self) -> &'static str {
        self.badge.css_class()
    }
}
