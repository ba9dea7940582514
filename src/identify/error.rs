//! Errors for identification requests, on both sides of the relay.

/// Errors that can occur while identifying a plant photo.
#[derive(Debug, thiserror::Error)]
pub enum IdentifyError {
    #[error("Plant.id API key not configured")]
    MissingApiKey,

    /// Upstream rejected the key (HTTP 401). Usually a misconfiguration.
    #[error("API key is invalid. Please check your Plant.id API key configuration.")]
    InvalidApiKey {
        /// Raw body returned alongside the 401
        details: String,
    },

    #[error("{message}")]
    Api {
        /// HTTP status returned by the remote side
        status: u16,
        /// Human-readable summary
        message: String,
        /// Raw error body, if any
        details: Option<String>,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No images supplied")]
    EmptyImages,

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid response from identification service: {0}")]
    InvalidResponse(String),

    #[error("Network error: {message} (after {attempts} attempts)")]
    NetworkError {
        /// Human-readable network error message
        message: String,
        /// Number of attempts made before giving up
        attempts: u32,
    },
}

impl IdentifyError {
    /// HTTP status associated with the failure, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            IdentifyError::InvalidApiKey { .. } => Some(401),
            IdentifyError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure is a rejected API key rather than a generic error.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, IdentifyError::InvalidApiKey { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_api_key_message_is_distinct() {
        let unauthorized = IdentifyError::InvalidApiKey {
            details: "bad key".to_string(),
        };
        let generic = IdentifyError::Api {
            status: 500,
            message: "Failed to identify plant".to_string(),
            details: None,
        };
        assert!(unauthorized.to_string().contains("API key is invalid"));
        assert_eq!(generic.to_string(), "Failed to identify plant");
        assert!(unauthorized.is_unauthorized());
        assert!(!generic.is_unauthorized());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            IdentifyError::InvalidApiKey {
                details: String::new()
            }
            .status(),
            Some(401)
        );
        assert_eq!(
            IdentifyError::Api {
                status: 429,
                message: "slow down".to_string(),
                details: None
            }
            .status(),
            Some(429)
        );
        assert_eq!(IdentifyError::EmptyImages.status(), None);
    }

    #[test]
    fn test_network_error_display() {
        let error = IdentifyError::NetworkError {
            message: "connection refused".to_string(),
            attempts: 3,
        };
        assert_eq!(
            error.to_string(),
            "Network error: connection refused (after 3 attempts)"
        );
    }
}
