//! Configuration file handling for leafsnap.
//!
//! Loads configuration from `<config dir>/leafsnap/config.toml` or a custom path.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::camera::{FacingMode, SessionSettings};
use crate::identify::{
    GeoHint, DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DEFAULT_NETWORK_RETRIES, DEFAULT_RELAY_URL,
    PLANT_ID_API_KEY_ENV, PLANT_ID_BASE_URL,
};

/// Configuration file structure for leafsnap.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub identify: IdentifyConfig,
    #[serde(default)]
    pub camera: CameraConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IdentifyConfig {
    /// Overridden by `PLANT_ID_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    #[serde(default = "default_network_retries")]
    pub network_retries: u32,
}

impl Default for IdentifyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            relay_url: default_relay_url(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            network_retries: default_network_retries(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub facing: FacingMode,
    #[serde(default = "default_ready_fallback_ms")]
    pub ready_fallback_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing: FacingMode::default(),
            ready_fallback_ms: default_ready_fallback_ms(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_base_url() -> String {
    PLANT_ID_BASE_URL.to_string()
}

fn default_relay_url() -> String {
    DEFAULT_RELAY_URL.to_string()
}

fn default_latitude() -> f64 {
    DEFAULT_LATITUDE
}

fn default_longitude() -> f64 {
    DEFAULT_LONGITUDE
}

fn default_network_retries() -> u32 {
    DEFAULT_NETWORK_RETRIES
}

fn default_ready_fallback_ms() -> u64 {
    2000
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }
}

impl IdentifyConfig {
    /// API key from the environment, falling back to the config file.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(PLANT_ID_API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|key| !key.trim().is_empty()))
    }

    pub fn geo_hint(&self) -> GeoHint {
        GeoHint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

impl CameraConfig {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            initial_facing: self.facing,
            ready_fallback: Duration::from_millis(self.ready_fallback_ms),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("leafsnap").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/leafsnap/config.toml")
        })
}

/// Commented default configuration written by `config init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# leafsnap configuration

[server]
# Address the identification relay listens on
bind = "127.0.0.1:3000"

[identify]
# Plant.id API key (PLANT_ID_API_KEY in the environment takes precedence)
# api_key = ""
base_url = "https://plant.id"
# Relay used by `leafsnap identify` and `leafsnap simulate --identify`
relay_url = "http://127.0.0.1:3000"
# Location hint for regional suggestions
latitude = 28.7041
longitude = 77.1025
# Retries for transient upstream network failures
network_retries = 2

[camera]
# Initial camera: "environment" (back) or "user" (front)
facing = "environment"
# Readiness fallback check delay
ready_fallback_ms = 2000
"#;
