//! Camera types and data structures.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Kind of media device reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

/// Information about an available capture device.
///
/// The label may be empty: most platforms only reveal labels once camera
/// permission has been granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Platform device identifier
    pub device_id: String,
    /// Human-readable device label (possibly empty)
    pub label: String,
    /// Device kind
    pub kind: DeviceKind,
}

impl CameraDevice {
    /// Create a video input device entry.
    pub fn video(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
            kind: DeviceKind::VideoInput,
        }
    }

    /// Whether the label suggests a rear-facing camera.
    pub fn looks_rear_facing(&self) -> bool {
        let label = self.label.to_lowercase();
        ["back", "rear", "environment"]
            .iter()
            .any(|keyword| label.contains(keyword))
    }
}

impl fmt::Display for CameraDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            write!(f, "{} (unlabelled)", self.device_id)
        } else {
            write!(f, "{} ({})", self.label, self.device_id)
        }
    }
}

/// Which physical camera a stream is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front (selfie) camera
    User,
    /// Back (rear) camera
    #[default]
    Environment,
}

impl FacingMode {
    /// The opposite camera.
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::User => FacingMode::Environment,
            FacingMode::Environment => FacingMode::User,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" | "front" => Ok(FacingMode::User),
            "environment" | "back" | "rear" => Ok(FacingMode::Environment),
            other => Err(format!(
                "Unknown facing mode '{}'. Use 'user' or 'environment'",
                other
            )),
        }
    }
}

/// Decode progress reported by a video sink, ordered from least to most ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ReadyState {
    #[default]
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

/// Settings actually negotiated for a stream's video track.
///
/// Platforms may silently substitute a different camera than the one
/// requested, so these are the source of truth after acquisition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackSettings {
    pub device_id: Option<String>,
    pub facing_mode: Option<FacingMode>,
    pub width: u32,
    pub height: u32,
    pub frame_rate: Option<u32>,
}

/// Pixel format of a raw frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// RGB format (3 bytes per pixel)
    Rgb,
}

/// A raw frame read from a video sink at its native dimensions.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: FrameFormat,
}

impl Frame {
    /// Get the number of bytes per pixel (3 for RGB).
    pub fn bytes_per_pixel(&self) -> usize {
        match self.format {
            FrameFormat::Rgb => 3,
        }
    }

    /// Whether the buffer length matches the declared dimensions.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.width as usize * self.height as usize * self.bytes_per_pixel()
    }
}

/// A still image taken from the live stream.
///
/// The session does not keep captured frames; ownership passes to the caller.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// JPEG-encoded bytes
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Whether the frame was flipped horizontally to match a mirrored preview
    pub mirrored: bool,
}

impl CapturedFrame {
    /// Bare base64 payload, as expected by the identification route.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.jpeg)
    }

    /// `data:image/jpeg;base64,...` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.to_base64())
    }
}

/// Errors raised while discovering devices or acquiring a stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    #[error("Camera not supported on this platform")]
    Unsupported,

    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("Camera is in use by another application: {0}")]
    DeviceBusy(String),

    #[error("No camera satisfies constraint '{constraint}'")]
    Overconstrained { constraint: String },

    #[error("No cameras found")]
    NoDevices,

    #[error("Failed to start camera stream: {0}")]
    StreamFailed(String),

    #[error("Camera start was superseded by a newer request")]
    Superseded,
}

/// Errors raised by a capture attempt. None of these change the session status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("Camera components not ready")]
    NoSink,

    #[error("Video not ready for capture. Please wait or try again.")]
    NotReady,

    #[error("Video has no dimensions. Please check camera connection.")]
    ZeroDimensions,

    #[error("No frame available from the video sink")]
    NoFrame,

    #[error("Failed to capture image data: {0}")]
    EncodeFailed(String),
}
