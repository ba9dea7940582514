//! Plant identification over HTTP.
//!
//! [`PlantIdClient`] talks to Plant.id and is used by the relay route.
//! [`IdentifyClient`] talks to the relay route and is what capture flows call.

mod caller;
mod client;
mod error;
mod request;
mod retry;

pub use caller::{IdentifyClient, DEFAULT_RELAY_URL, IDENTIFY_ROUTE};
pub use client::{GeoHint, PlantIdClient, PLANT_ID_API_KEY_ENV, PLANT_ID_BASE_URL};
pub use error::IdentifyError;
pub use request::{
    encode_image_bytes, encode_image_file, strip_data_url_prefix, validate_images,
    IdentifyRequest, DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DETAIL_FIELDS,
};
pub use retry::{
    calculate_backoff, is_transient_network_error, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX,
    DEFAULT_NETWORK_RETRIES,
};
