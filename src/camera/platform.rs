//! Platform seams the camera session is written against.
//!
//! A platform provides device enumeration and stream acquisition. The video
//! sink is whatever renders the live preview and can hand back the current
//! frame.

use async_trait::async_trait;

use super::constraints::StreamConstraints;
use super::types::{CameraDevice, CameraError, Frame, ReadyState, TrackSettings};

/// Capture backend: device discovery and stream acquisition.
#[async_trait]
pub trait MediaPlatform: Send + Sync {
    type Stream: MediaStream;

    /// Whether the platform exposes a media capture API at all.
    fn is_supported(&self) -> bool;

    /// Whether this is a handheld device with front and back cameras.
    fn is_mobile(&self) -> bool {
        false
    }

    /// List media devices in platform order.
    async fn enumerate_devices(&self) -> Result<Vec<CameraDevice>, CameraError>;

    /// Request a stream matching the given constraints.
    async fn get_user_media(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Self::Stream, CameraError>;
}

/// A live media stream holding one or more hardware tracks.
pub trait MediaStream: Send + 'static {
    fn id(&self) -> &str;

    /// Negotiated settings of the first video track.
    fn video_settings(&self) -> TrackSettings;

    /// Stop every track individually. Returns how many were still live.
    fn stop_tracks(&mut self) -> usize;
}

/// Readiness signals a sink may deliver, in whatever order the platform fires them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    LoadedMetadata,
    CanPlay,
    Playing,
}

/// Renders a bound stream and exposes its current decoded frame.
pub trait VideoSink<S: MediaStream>: Send {
    fn attach(&mut self, stream: &S);

    fn detach(&mut self);

    fn ready_state(&self) -> ReadyState;

    /// Native decoded frame dimensions, `(0, 0)` when unknown.
    fn dimensions(&self) -> (u32, u32);

    /// Copy of the current frame at native dimensions.
    fn current_frame(&self) -> Option<Frame>;
}
