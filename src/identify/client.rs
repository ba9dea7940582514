//! PlantIdClient - forwards identification requests to Plant.id.

use std::time::Duration;

use serde_json::Value;

use super::error::IdentifyError;
use super::request::{
    validate_images, UpstreamRequest, DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DETAIL_FIELDS,
};
use super::retry::{
    calculate_backoff, is_transient_network_error, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX,
};

/// The environment variable name for the Plant.id API key.
pub const PLANT_ID_API_KEY_ENV: &str = "PLANT_ID_API_KEY";

/// Default base URL for the Plant.id API.
pub const PLANT_ID_BASE_URL: &str = "https://plant.id";

/// Identification endpoint path (API v3).
const IDENTIFICATION_PATH: &str = "/api/v3/identification";

/// Default timeout for HTTP requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Location hint that improves regional suggestions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoHint {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for GeoHint {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
        }
    }
}

/// Client for the Plant.id identification API.
pub struct PlantIdClient {
    api_key: String,
    base_url: String,
    geo: GeoHint,
    similar_images: bool,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for PlantIdClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlantIdClient")
            .field("base_url", &self.base_url)
            .field("geo", &self.geo)
            .finish_non_exhaustive()
    }
}

impl PlantIdClient {
    /// Create a new client by reading the API key from `PLANT_ID_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns `IdentifyError::MissingApiKey` if the variable is not set.
    pub fn new() -> Result<Self, IdentifyError> {
        let api_key =
            std::env::var(PLANT_ID_API_KEY_ENV).map_err(|_| IdentifyError::MissingApiKey)?;
        Self::with_api_key(api_key)
    }

    /// Create a new client with an explicit API key.
    pub fn with_api_key(api_key: String) -> Result<Self, IdentifyError> {
        Self::with_base_url(api_key, PLANT_ID_BASE_URL.to_string())
    }

    /// Create a new client against a custom base URL.
    ///
    /// Useful for testing against a mock server.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, IdentifyError> {
        if api_key.trim().is_empty() {
            return Err(IdentifyError::MissingApiKey);
        }

        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            geo: GeoHint::default(),
            similar_images: true,
            http_client,
        })
    }

    /// Override the location hint.
    pub fn with_geo_hint(mut self, geo: GeoHint) -> Self {
        self.geo = geo;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn geo_hint(&self) -> GeoHint {
        self.geo
    }

    /// Full identification URL including the requested detail fields.
    pub fn identification_url(&self) -> String {
        format!(
            "{}{}?details={}",
            self.base_url,
            IDENTIFICATION_PATH,
            DETAIL_FIELDS.join(",")
        )
    }

    /// Submit images for identification and return the upstream JSON unchanged.
    ///
    /// # Errors
    ///
    /// Returns `IdentifyError::InvalidApiKey` on HTTP 401,
    /// `IdentifyError::Api` carrying the upstream status and body for any
    /// other non-2xx response, or `IdentifyError::Http` if the request fails.
    pub async fn identify(&self, images: &[String]) -> Result<Value, IdentifyError> {
        validate_images(images)?;

        let body = UpstreamRequest {
            images,
            latitude: self.geo.latitude,
            longitude: self.geo.longitude,
            similar_images: self.similar_images,
        };

        let response = self
            .http_client
            .post(self.identification_url())
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        log::info!("Plant.id API response status: {}", status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Plant.id API error {}: {}", status, error_text);

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(IdentifyError::InvalidApiKey {
                    details: error_text,
                });
            }

            return Err(IdentifyError::Api {
                status: status.as_u16(),
                message: format!("Plant.id API error: {}", status),
                details: Some(error_text),
            });
        }

        let data: Value = response.json().await?;
        log::info!("Plant.id API response received successfully");
        Ok(data)
    }

    /// Like [`identify`](Self::identify), retrying transient network failures.
    ///
    /// HTTP error statuses are never retried.
    pub async fn identify_with_network_retry(
        &self,
        images: &[String],
        max_retries: u32,
    ) -> Result<Value, IdentifyError> {
        let mut attempt = 0u32;

        loop {
            match self.identify(images).await {
                Err(IdentifyError::Http(ref http_err)) if is_transient_network_error(http_err) => {
                    if attempt >= max_retries {
                        log::error!(
                            "Network error after {} attempts. Giving up. Error: {}",
                            attempt + 1,
                            http_err
                        );
                        return Err(IdentifyError::NetworkError {
                            message: http_err.to_string(),
                            attempts: attempt + 1,
                        });
                    }

                    let delay = calculate_backoff(attempt, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX);
                    log::warn!(
                        "Network error (attempt {}/{}): {}. Retrying in {:?}...",
                        attempt + 1,
                        max_retries + 1,
                        http_err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_api_key_uses_defaults() {
        let client = PlantIdClient::with_api_key("key".to_string()).unwrap();
        assert_eq!(client.base_url(), PLANT_ID_BASE_URL);
        assert_eq!(client.geo_hint(), GeoHint::default());
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        assert!(matches!(
            PlantIdClient::with_api_key("  ".to_string()),
            Err(IdentifyError::MissingApiKey)
        ));
    }

    #[test]
    fn test_identification_url_lists_details() {
        let client =
            PlantIdClient::with_base_url("key".to_string(), "http://localhost:1/".to_string())
                .unwrap();
        let url = client.identification_url();
        assert!(url.starts_with("http://localhost:1/api/v3/identification?details=common_names,url,"));
        assert!(url.ends_with("toxicity,best_watering"));
    }

    #[test]
    fn test_with_geo_hint() {
        let geo = GeoHint {
            latitude: 51.5,
            longitude: -0.12,
        };
        let client = PlantIdClient::with_api_key("key".to_string())
            .unwrap()
            .with_geo_hint(geo);
        assert_eq!(client.geo_hint(), geo);
    }

    #[tokio::test]
    async fn test_identify_rejects_empty_images_without_network() {
        let client =
            PlantIdClient::with_base_url("key".to_string(), "http://127.0.0.1:9".to_string())
                .unwrap();
        assert!(matches!(
            client.identify(&[]).await,
            Err(IdentifyError::EmptyImages)
        ));
    }

    #[tokio::test]
    async fn test_network_retry_gives_up_with_attempt_count() {
        let client =
            PlantIdClient::with_base_url("key".to_string(), "http://127.0.0.1:9".to_string())
                .unwrap();
        let images = vec!["AQID".to_string()];
        match client.identify_with_network_retry(&images, 0).await {
            Err(IdentifyError::NetworkError { attempts, .. }) => assert_eq!(attempts, 1),
            other => panic!("Expected NetworkError, got {:?}", other),
        }
    }

    mod mock_http_tests {
        use super::*;
        use wiremock::matchers::{body_json, header, method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn images() -> Vec<String> {
            vec!["/9j/4AAQ".to_string()]
        }

        #[tokio::test]
        async fn test_identify_sends_key_body_and_details() {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .and(path("/api/v3/identification"))
                .and(query_param("details", DETAIL_FIELDS.join(",")))
                .and(header("Api-Key", "test-key"))
                .and(body_json(serde_json::json!({
                    "images": ["/9j/4AAQ"],
                    "latitude": 28.7041,
                    "longitude": 77.1025,
                    "similar_images": true
                })))
                .respond_with(
                    ResponseTemplate::new(201)
                        .set_body_json(serde_json::json!({"access_token": "abc"})),
                )
                .expect(1)
                .mount(&mock_server)
                .await;

            let client =
                PlantIdClient::with_base_url("test-key".to_string(), mock_server.uri()).unwrap();
            let result = client.identify(&images()).await.unwrap();
            assert_eq!(result["access_token"], "abc");
        }

        #[tokio::test]
        async fn test_identify_maps_401_to_invalid_api_key() {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
                .mount(&mock_server)
                .await;

            let client =
                PlantIdClient::with_base_url("bad-key".to_string(), mock_server.uri()).unwrap();
            match client.identify(&images()).await {
                Err(IdentifyError::InvalidApiKey { details }) => {
                    assert_eq!(details, "invalid api key")
                }
                other => panic!("Expected InvalidApiKey, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_identify_passes_other_status_through() {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
                .expect(1)
                .mount(&mock_server)
                .await;

            let client =
                PlantIdClient::with_base_url("key".to_string(), mock_server.uri()).unwrap();
            match client.identify_with_network_retry(&images(), 3).await {
                Err(IdentifyError::Api {
                    status,
                    message,
                    details,
                }) => {
                    assert_eq!(status, 429);
                    assert_eq!(message, "Plant.id API error: 429 Too Many Requests");
                    assert_eq!(details.as_deref(), Some("quota exceeded"));
                }
                other => panic!("Expected Api error, got {:?}", other),
            }
        }
    }
}
