//! Client for the local identification relay route.

use std::path::Path;
use std::time::Duration;

use serde_json::Value;

use super::error::IdentifyError;
use super::request::{encode_image_file, strip_data_url_prefix, IdentifyRequest};
use crate::camera::CapturedFrame;

/// Path of the relay route.
pub const IDENTIFY_ROUTE: &str = "/api/identify-plant";

/// Default address of a locally running relay.
pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:3000";

/// Fallback message when the relay gives no error text.
const GENERIC_FAILURE: &str = "Failed to identify plant";

/// Identification can take a while upstream; allow more than the relay's own timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

/// Sends photos to the relay route and interprets its answers.
#[derive(Debug, Clone)]
pub struct IdentifyClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl IdentifyClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, IdentifyError> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Identify bare base64 images.
    ///
    /// # Errors
    ///
    /// `IdentifyError::InvalidApiKey` when the relay answers 401, otherwise
    /// `IdentifyError::Api` with the relay's `error` text for any non-2xx.
    pub async fn identify_images(&self, images: Vec<String>) -> Result<Value, IdentifyError> {
        if images.is_empty() {
            return Err(IdentifyError::EmptyImages);
        }

        let url = format!("{}{}", self.base_url, IDENTIFY_ROUTE);
        let response = self
            .http_client
            .post(&url)
            .json(&IdentifyRequest::new(images))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body: Option<Value> = serde_json::from_str(&text).ok();

        let field = |name: &str| {
            body.as_ref()
                .and_then(|b| b.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        if status == reqwest::StatusCode::UNAUTHORIZED {
            // Prefer the upstream reason over the relay's fixed message
            let details = field("details").or_else(|| field("error")).unwrap_or(text);
            return Err(IdentifyError::InvalidApiKey { details });
        }

        if !status.is_success() {
            return Err(IdentifyError::Api {
                status: status.as_u16(),
                message: field("error").unwrap_or_else(|| GENERIC_FAILURE.to_string()),
                details: field("details"),
            });
        }

        body.ok_or_else(|| IdentifyError::InvalidResponse("response body is not JSON".to_string()))
    }

    /// Identify a `data:` URL or bare base64 string.
    pub async fn identify_data_url(&self, image: &str) -> Result<Value, IdentifyError> {
        self.identify_images(vec![strip_data_url_prefix(image).to_string()])
            .await
    }

    /// Identify an image file from disk.
    pub async fn identify_file(&self, path: &Path) -> Result<Value, IdentifyError> {
        let encoded = encode_image_file(path).await?;
        self.identify_images(vec![encoded]).await
    }

    /// Identify a still captured from a camera session.
    pub async fn identify_frame(&self, frame: &CapturedFrame) -> Result<Value, IdentifyError> {
        self.identify_images(vec![frame.to_base64()]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = IdentifyClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_empty_images_fail_fast() {
        let client = IdentifyClient::new(DEFAULT_RELAY_URL).unwrap();
        assert!(matches!(
            client.identify_images(Vec::new()).await,
            Err(IdentifyError::EmptyImages)
        ));
    }

    mod mock_http_tests {
        use super::*;
        use wiremock::matchers::{body_json, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        #[tokio::test]
        async fn test_data_url_prefix_is_stripped() {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .and(path(IDENTIFY_ROUTE))
                .and(body_json(serde_json::json!({"images": ["/9j/AAAA"]})))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})),
                )
                .expect(1)
                .mount(&mock_server)
                .await;

            let client = IdentifyClient::new(mock_server.uri()).unwrap();
            let result = client
                .identify_data_url("data:image/jpeg;base64,/9j/AAAA")
                .await
                .unwrap();
            assert_eq!(result["ok"], true);
        }

        #[tokio::test]
        async fn test_401_surfaces_invalid_api_key() {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                    "error": "Invalid or missing Plant.id API key. Please check your API key configuration.",
                    "details": "bad key"
                })))
                .mount(&mock_server)
                .await;

            let client = IdentifyClient::new(mock_server.uri()).unwrap();
            let err = client
                .identify_images(vec!["AQID".to_string()])
                .await
                .unwrap_err();
            assert!(err.is_unauthorized());
            assert_eq!(
                err.to_string(),
                "API key is invalid. Please check your Plant.id API key configuration."
            );
            match err {
                IdentifyError::InvalidApiKey { details } => assert_eq!(details, "bad key"),
                other => panic!("Expected InvalidApiKey, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_401_without_details_falls_back_to_error_text() {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .respond_with(
                    ResponseTemplate::new(401)
                        .set_body_json(serde_json::json!({"error": "key revoked"})),
                )
                .mount(&mock_server)
                .await;

            let client = IdentifyClient::new(mock_server.uri()).unwrap();
            match client.identify_images(vec!["AQID".to_string()]).await {
                Err(IdentifyError::InvalidApiKey { details }) => {
                    assert_eq!(details, "key revoked")
                }
                other => panic!("Expected InvalidApiKey, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_other_errors_use_relay_message() {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                    "error": "Plant.id API error: 503 Service Unavailable",
                    "details": "maintenance"
                })))
                .mount(&mock_server)
                .await;

            let client = IdentifyClient::new(mock_server.uri()).unwrap();
            match client.identify_images(vec!["AQID".to_string()]).await {
                Err(IdentifyError::Api {
                    status,
                    message,
                    details,
                }) => {
                    assert_eq!(status, 503);
                    assert_eq!(message, "Plant.id API error: 503 Service Unavailable");
                    assert_eq!(details.as_deref(), Some("maintenance"));
                }
                other => panic!("Expected Api error, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_non_json_error_body_falls_back_to_generic_message() {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
                .mount(&mock_server)
                .await;

            let client = IdentifyClient::new(mock_server.uri()).unwrap();
            let err = client
                .identify_images(vec!["AQID".to_string()])
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), GENERIC_FAILURE);
            assert_eq!(err.status(), Some(502));
        }
    }
}
