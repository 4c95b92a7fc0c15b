use std::error::Error as StdError;
use thiserror::Error;

/// Failures of a single selection or submission attempt.
///
/// Every variant is terminal for the attempt it belongs to. None of them are
/// retried; the session turns them into a user-visible message.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClassifierError {
    /// The selected file does not carry an image media type
    #[error("selected file is not an image (media type: {media_type})")]
    InvalidInput { media_type: String },

    /// Network unreachable, request aborted or timed out
    #[error("{0}")]
    TransportFailure(String),

    /// The inference service answered with a non-2xx status
    #[error("HTTP error! status: {status}")]
    ServerError { status: u16 },

    /// A 2xx body without a usable label/confidence pair
    #[error("malformed response from inference service: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ClassifierError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClassifierError::TransportFailure(format!("request timed out: {}", with_causes(&err)))
        } else if let Some(status) = err.status() {
            ClassifierError::ServerError {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            ClassifierError::MalformedResponse(with_causes(&err))
        } else {
            ClassifierError::TransportFailure(with_causes(&err))
        }
    }
}

/// Render an error followed by each of its sources, `outer: inner: ...`.
/// Sources whose text is already part of the message are skipped.
fn with_causes(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
