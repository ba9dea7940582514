//! Camera session management.
//!
//! This module provides the camera layer consumed by the identification flow:
//! - Device enumeration and stream lifecycle via [`CameraSession`]
//! - The constraint ladder via [`ladder`]
//! - Platform seams via [`MediaPlatform`], [`MediaStream`] and [`VideoSink`]
//! - A deterministic backend in [`synthetic`]

mod constraints;
mod frame_utils;
mod platform;
mod session;
mod state;
pub mod synthetic;
mod types;

pub use constraints::{
    ladder, FacingConstraint, Range, StreamConstraints, VideoConstraints, HIGH_FRAME_RATE,
    HIGH_HEIGHT, HIGH_WIDTH, LOW_HEIGHT, LOW_WIDTH,
};
pub use frame_utils::{encode_jpeg, mirror_horizontal, JPEG_QUALITY, MIN_ENCODED_LEN};
pub use platform::{MediaPlatform, MediaStream, SinkEvent, VideoSink};
pub use session::{CameraSession, SessionSettings, DEFAULT_READY_FALLBACK};
pub use state::{CameraStatus, SessionEvent};
pub use types::{
    CameraDevice, CameraError, CaptureError, CapturedFrame, DeviceKind, FacingMode, Frame,
    FrameFormat, ReadyState, TrackSettings,
};
