//! Request bodies and image payload helpers.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::error::IdentifyError;

/// Detail fields requested from Plant.id for every suggestion.
pub const DETAIL_FIELDS: &[&str] = &[
    "common_names",
    "url",
    "description",
    "taxonomy",
    "rank",
    "gbif_id",
    "inaturalist_id",
    "image",
    "synonyms",
    "edible_parts",
    "watering",
    "best_light_condition",
    "best_soil_type",
    "common_uses",
    "cultural_significance",
    "toxicity",
    "best_watering",
];

/// Default geolocation hint sent with every identification.
pub const DEFAULT_LATITUDE: f64 = 28.7041;
pub const DEFAULT_LONGITUDE: f64 = 77.1025;

/// Body accepted by the relay route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifyRequest {
    /// Bare base64 image payloads
    pub images: Vec<String>,
}

impl IdentifyRequest {
    pub fn new(images: Vec<String>) -> Self {
        Self { images }
    }
}

/// Body forwarded to Plant.id.
#[derive(Debug, Serialize)]
pub(crate) struct UpstreamRequest<'a> {
    pub images: &'a [String],
    pub latitude: f64,
    pub longitude: f64,
    pub similar_images: bool,
}

/// Strip a `data:<mime>;base64,` prefix, leaving the bare payload.
pub fn strip_data_url_prefix(image: &str) -> &str {
    match image.split_once(',') {
        Some((_, payload)) => payload,
        None => image,
    }
}

/// Base64-encode raw image bytes.
pub fn encode_image_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Read an image file and base64-encode it.
pub async fn encode_image_file(path: &Path) -> Result<String, IdentifyError> {
    let bytes = tokio::fs::read(path).await?;
    if bytes.is_empty() {
        return Err(IdentifyError::InvalidImage(format!(
            "'{}' is empty",
            path.display()
        )));
    }
    Ok(encode_image_bytes(&bytes))
}

/// Check that at least one image is present and none is blank.
///
/// Payloads are otherwise forwarded untouched. Plant.id accepts data URLs
/// and unpadded or line-wrapped base64.
pub fn validate_images(images: &[String]) -> Result<(), IdentifyError> {
    if images.is_empty() {
        return Err(IdentifyError::EmptyImages);
    }
    for (i, image) in images.iter().enumerate() {
        if image.trim().is_empty() {
            return Err(IdentifyError::InvalidImage(format!("image {} is empty", i)));
        }
    }
    Ok(())
}
