use super::{ClassificationResult, ClassifierError, ImageFile};
use crate::cli::InferenceConfig;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Name of the multipart field the inference service reads the image from
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
struct PingResponse {
    message: String,
}

/// HTTP client for the external inference service
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    base_url: String,
}

impl InferenceClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, ClassifierError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClassifierError::TransportFailure(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POST the image to `/predict` and parse the classification.
    ///
    /// Exactly one request is made; failures are returned as-is.
    #[instrument(skip(self, image), fields(file = %image.file_name))]
    pub async fn predict(&self, image: ImageFile) -> Result<ClassificationResult, ClassifierError> {
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.media_type)
            .map_err(|_| ClassifierError::InvalidInput {
                media_type: image.media_type.clone(),
            })?;
        let form = Form::new().part(FILE_FIELD, part);

        let response = self
            .http
            .post(self.url("predict"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        debug!("Inference service answered {}", status);
        if !status.is_success() {
            return Err(ClassifierError::ServerError {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        ClassificationResult::from_response_body(&body)
    }

    /// Check that the inference service is up via `GET /ping`
    pub async fn ping(&self) -> Result<String, ClassifierError> {
        let response = self.http.get(self.url("ping")).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierError::ServerError {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let ping: PingResponse = serde_json::from_slice(&body)
            .map_err(|e| ClassifierError::MalformedResponse(e.to_string()))?;
        Ok(ping.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockInference, MockReply};
    use axum::http::StatusCode;

    fn client_for(mock: &MockInference, timeout_secs: u64) -> InferenceClient {
        InferenceClient::new(&InferenceConfig {
            base_url: format!("{}/", mock.base_url),
            timeout_secs,
        })
        .unwrap()
    }

    fn leaf() -> ImageFile {
        ImageFile::new("leaf.png", "image/png", vec![0x89, 0x50, 0x4E, 0x47])
    }

    #[tokio::test]
    async fn test_predict_sends_single_file_part() {
        let mock = MockInference::start(MockReply::ok(r#"{"class":"Healthy","confidence":0.93}"#))
            .await;
        let client = client_for(&mock, 5);

        let result = client.predict(leaf()).await.unwrap();
        assert_eq!(result, ClassificationResult::new("Healthy", 0.93).unwrap());

        assert_eq!(mock.hits(), 1);
        let upload = mock.last_upload().unwrap();
        assert_eq!(upload.field_names, vec![FILE_FIELD.to_string()]);
        assert_eq!(upload.file_name.as_deref(), Some("leaf.png"));
        assert_eq!(upload.content_type.as_deref(), Some("image/png"));
        assert_eq!(upload.bytes, vec![0x89, 0x50, 0x4E, 0x47]);
    }

    #[tokio::test]
    async fn test_predict_server_error() {
        let mock = MockInference::start(MockReply::status(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"Prediction failed: bad image"}"#,
        ))
        .await;
        let client = client_for(&mock, 5);

        let err = client.predict(leaf()).await.unwrap_err();
        assert_eq!(err, ClassifierError::ServerError { status: 500 });
        assert_eq!(mock.hits(), 1);
    }

    #[tokio::test]
    async fn test_predict_missing_confidence() {
        let mock = MockInference::start(MockReply::ok(r#"{"class":"Healthy"}"#)).await;
        let client = client_for(&mock, 5);

        let err = client.predict(leaf()).await.unwrap_err();
        assert!(matches!(err, ClassifierError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_predict_timeout_is_transport_failure() {
        let mock = MockInference::start(
            MockReply::ok(r#"{"class":"Healthy","confidence":0.93}"#)
                .delayed(Duration::from_secs(3)),
        )
        .await;
        let client = client_for(&mock, 1);

        let err = client.predict(leaf()).await.unwrap_err();
        assert!(matches!(err, ClassifierError::TransportFailure(_)));
    }

    #[tokio::test]
    async fn test_predict_unreachable_service() {
        let client = InferenceClient::new(&InferenceConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
        })
        .unwrap();

        let err = client.predict(leaf()).await.unwrap_err();
        match err {
            ClassifierError::TransportFailure(message) => {
                assert!(message.contains("127.0.0.1:9"), "message: {}", message);
                assert!(
                    message.to_lowercase().contains("refused"),
                    "cause missing from {:?}",
                    message
                );
            }
            other => panic!("expected transport failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ping() {
        let mock = MockInference::start(MockReply::ok("{}")).await;
        let client = client_for(&mock, 5);

        let message = client.ping().await.unwrap();
        assert_eq!(message, "Model API is alive and kicking!");
        assert_eq!(mock.hits(), 0);
    }
}
