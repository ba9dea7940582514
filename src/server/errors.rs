use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::identify::IdentifyError;

const INVALID_KEY_MESSAGE: &str =
    "Invalid or missing Plant.id API key. Please check your API key configuration.";
const GENERIC_FAILURE_MESSAGE: &str = "Failed to identify plant. Please try again.";

#[derive(Debug, Serialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    body: ErrorBody,
}

impl AppError {
    pub fn new(status: StatusCode, error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                details,
            },
        }
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            GENERIC_FAILURE_MESSAGE,
            Some(details.into()),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &ErrorBody {
        &self.body
    }
}

impl From<IdentifyError> for AppError {
    fn from(value: IdentifyError) -> Self {
        match value {
            IdentifyError::InvalidApiKey { details } => {
                Self::new(StatusCode::UNAUTHORIZED, INVALID_KEY_MESSAGE, Some(details))
            }
            IdentifyError::Api {
                status,
                message,
                details,
            } => {
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                Self::new(status, message, details)
            }
            err @ (IdentifyError::EmptyImages | IdentifyError::InvalidImage(_)) => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string(), None)
            }
            other => Self::internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_key_maps_to_401() {
        let err = AppError::from(IdentifyError::InvalidApiKey {
            details: "nope".to_string(),
        });
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.body().error, INVALID_KEY_MESSAGE);
        assert_eq!(err.body().details.as_deref(), Some("nope"));
    }

    #[test]
    fn test_upstream_status_passes_through() {
        let err = AppError::from(IdentifyError::Api {
            status: 404,
            message: "Plant.id API error: 404 Not Found".to_string(),
            details: Some("missing".to_string()),
        });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.body().error, "Plant.id API error: 404 Not Found");
    }

    #[test]
    fn test_empty_images_is_bad_request() {
        let err = AppError::from(IdentifyError::EmptyImages);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_other_failures_are_generic_500() {
        let err = AppError::from(IdentifyError::NetworkError {
            message: "refused".to_string(),
            attempts: 3,
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body().error, GENERIC_FAILURE_MESSAGE);
        assert!(err.body().details.as_deref().unwrap().contains("refused"));
    }

    #[test]
    fn test_error_body_omits_missing_details() {
        let body = ErrorBody {
            error: "x".to_string(),
            details: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"error": "x"})
        );
    }
}
