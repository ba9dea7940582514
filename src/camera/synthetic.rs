//! Deterministic in-process capture backend.
//!
//! Models the behaviours real cameras exhibit that the session has to cope
//! with: cameras that only face one way, desktop webcams that report no
//! facing mode, permission failures, slow acquisition, and sinks that decode
//! their first frame some time after the stream is attached.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::constraints::{FacingConstraint, StreamConstraints, VideoConstraints};
use super::platform::{MediaPlatform, MediaStream, VideoSink};
use super::types::{
    CameraDevice, CameraError, DeviceKind, FacingMode, Frame, FrameFormat, ReadyState,
    TrackSettings,
};

/// A simulated physical camera.
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    pub device_id: String,
    pub label: String,
    /// `None` for cameras that do not report a facing mode (typical webcams)
    pub facing: Option<FacingMode>,
    pub width: u32,
    pub height: u32,
}

impl SyntheticCamera {
    pub fn front(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            label: "Front Camera".to_string(),
            facing: Some(FacingMode::User),
            width: 1280,
            height: 720,
        }
    }

    pub fn back(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            label: "Back Camera".to_string(),
            facing: Some(FacingMode::Environment),
            width: 1920,
            height: 1080,
        }
    }

    pub fn webcam(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            label: "USB Webcam".to_string(),
            facing: None,
            width: 640,
            height: 480,
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    fn satisfies(&self, constraints: &VideoConstraints) -> bool {
        if let Some(id) = &constraints.device_id {
            if *id != self.device_id {
                return false;
            }
        }
        if let Some(FacingConstraint::Exact(mode)) = constraints.facing_mode {
            if self.facing != Some(mode) {
                return false;
            }
        }
        let width_ok = constraints.width.map_or(true, |r| r.admits(self.width));
        let height_ok = constraints.height.map_or(true, |r| r.admits(self.height));
        width_ok && height_ok
    }
}

/// Simulated capture platform.
pub struct SyntheticPlatform {
    cameras: Vec<SyntheticCamera>,
    supported: bool,
    mobile: bool,
    failure: Option<CameraError>,
    latency: Duration,
    live_tracks: Arc<AtomicUsize>,
    attempts: Mutex<Vec<StreamConstraints>>,
    next_stream: AtomicU64,
}

impl SyntheticPlatform {
    pub fn new(cameras: Vec<SyntheticCamera>) -> Self {
        Self {
            cameras,
            supported: true,
            mobile: false,
            failure: None,
            latency: Duration::ZERO,
            live_tracks: Arc::new(AtomicUsize::new(0)),
            attempts: Mutex::new(Vec::new()),
            next_stream: AtomicU64::new(1),
        }
    }

    /// A phone with a front and a back camera.
    pub fn phone() -> Self {
        Self::new(vec![
            SyntheticCamera::front("front-0"),
            SyntheticCamera::back("back-0"),
        ])
        .mobile(true)
    }

    /// A platform with no media capture API.
    pub fn unsupported() -> Self {
        let mut platform = Self::new(Vec::new());
        platform.supported = false;
        platform
    }

    pub fn mobile(mut self, mobile: bool) -> Self {
        self.mobile = mobile;
        self
    }

    /// Fail every stream request with this error.
    pub fn failing_with(mut self, error: CameraError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Delay every stream request.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of hardware tracks currently held open.
    pub fn live_tracks(&self) -> usize {
        self.live_tracks.load(Ordering::SeqCst)
    }

    /// Every constraint set requested so far, in order.
    pub fn attempts(&self) -> Vec<StreamConstraints> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn select(&self, constraints: &StreamConstraints) -> Result<&SyntheticCamera, CameraError> {
        if self.cameras.is_empty() {
            return Err(CameraError::NoDevices);
        }

        let video = match constraints {
            StreamConstraints::AnyVideo => return Ok(&self.cameras[0]),
            StreamConstraints::Video(video) => video,
        };

        let mut candidates: Vec<&SyntheticCamera> =
            self.cameras.iter().filter(|c| c.satisfies(video)).collect();

        if let Some(FacingConstraint::Ideal(mode)) = video.facing_mode {
            // Stable sort keeps platform order among equally good matches
            candidates.sort_by_key(|c| c.facing != Some(mode));
        }

        candidates
            .into_iter()
            .next()
            .ok_or_else(|| CameraError::Overconstrained {
                constraint: constraints.to_string(),
            })
    }
}

#[async_trait]
impl MediaPlatform for SyntheticPlatform {
    type Stream = SyntheticStream;

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn is_mobile(&self) -> bool {
        self.mobile
    }

    async fn enumerate_devices(&self) -> Result<Vec<CameraDevice>, CameraError> {
        if !self.supported {
            return Err(CameraError::Unsupported);
        }

        let mut devices = vec![CameraDevice {
            device_id: "default-mic".to_string(),
            label: "Default Microphone".to_string(),
            kind: DeviceKind::AudioInput,
        }];
        devices.extend(
            self.cameras
                .iter()
                .map(|c| CameraDevice::video(c.device_id.clone(), c.label.clone())),
        );
        Ok(devices)
    }

    async fn get_user_media(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<SyntheticStream, CameraError> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(constraints.clone());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let camera = self.select(constraints)?.clone();
        let n = self.next_stream.fetch_add(1, Ordering::SeqCst);
        self.live_tracks.fetch_add(1, Ordering::SeqCst);

        Ok(SyntheticStream {
            id: format!("synthetic-stream-{}", n),
            camera,
            live: true,
            live_tracks: Arc::clone(&self.live_tracks),
        })
    }
}

/// A stream holding a single simulated video track.
#[derive(Debug)]
pub struct SyntheticStream {
    id: String,
    camera: SyntheticCamera,
    live: bool,
    live_tracks: Arc<AtomicUsize>,
}

impl SyntheticStream {
    pub fn is_live(&self) -> bool {
        self.live
    }
}

impl MediaStream for SyntheticStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn video_settings(&self) -> TrackSettings {
        TrackSettings {
            device_id: Some(self.camera.device_id.clone()),
            facing_mode: self.camera.facing,
            width: self.camera.width,
            height: self.camera.height,
            frame_rate: Some(30),
        }
    }

    fn stop_tracks(&mut self) -> usize {
        if !self.live {
            return 0;
        }
        self.live = false;
        self.live_tracks.fetch_sub(1, Ordering::SeqCst);
        1
    }
}

#[derive(Debug, Default)]
struct SinkState {
    source: Option<(u32, u32)>,
    ready_state: ReadyState,
}

/// Simulated preview element.
///
/// Cloning yields another handle to the same sink, so a test can drive
/// decode progress while the session owns the bound copy.
#[derive(Debug, Clone, Default)]
pub struct SyntheticSink {
    state: Arc<Mutex<SinkState>>,
}

impl SyntheticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate decode progress on the attached stream.
    pub fn advance(&self, ready_state: ReadyState) {
        let mut state = self.lock();
        if state.source.is_some() {
            state.ready_state = ready_state;
        }
    }

    pub fn is_attached(&self) -> bool {
        self.lock().source.is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl VideoSink<SyntheticStream> for SyntheticSink {
    fn attach(&mut self, stream: &SyntheticStream) {
        let settings = stream.video_settings();
        let mut state = self.lock();
        state.source = Some((settings.width, settings.height));
        state.ready_state = ReadyState::HaveNothing;
    }

    fn detach(&mut self) {
        let mut state = self.lock();
        state.source = None;
        state.ready_state = ReadyState::HaveNothing;
    }

    fn ready_state(&self) -> ReadyState {
        self.lock().ready_state
    }

    fn dimensions(&self) -> (u32, u32) {
        let state = self.lock();
        match state.source {
            Some(dims) if state.ready_state >= ReadyState::HaveMetadata => dims,
            _ => (0, 0),
        }
    }

    fn current_frame(&self) -> Option<Frame> {
        let state = self.lock();
        if state.ready_state < ReadyState::HaveCurrentData {
            return None;
        }
        let (width, height) = state.source?;
        Some(split_pattern_frame(width, height))
    }
}

/// Left half warm, right half cool, with a vertical gradient.
///
/// The asymmetry makes horizontal mirroring observable after JPEG encoding.
pub fn split_pattern_frame(width: u32, height: u32) -> Frame {
    let mut data = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        let shade = if height > 1 { (y * 40 / (height - 1)) as u8 } else { 0 };
        for x in 0..width {
            if x < width / 2 {
                data.extend_from_slice(&[210, 60 + shade, 40]);
            } else {
                data.extend_from_slice(&[40, 60 + shade, 210]);
            }
        }
    }
    Frame {
        data,
        width,
        height,
        format: FrameFormat::Rgb,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::constraints::ladder;

    #[tokio::test]
    async fn test_enumerate_includes_non_video_devices() {
        let platform = SyntheticPlatform::phone();
        let devices = platform.enumerate_devices().await.unwrap();
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0].kind, DeviceKind::AudioInput);
    }

    #[tokio::test]
    async fn test_exact_facing_rejected_by_front_only_device() {
        let platform = SyntheticPlatform::new(vec![SyntheticCamera::front("f")]);
        let rungs = ladder(FacingMode::Environment, &[]);

        let exact = platform.get_user_media(&rungs[0]).await;
        assert!(matches!(exact, Err(CameraError::Overconstrained { .. })));

        let ideal = platform.get_user_media(&rungs[1]).await.unwrap();
        assert_eq!(ideal.video_settings().facing_mode, Some(FacingMode::User));
        assert_eq!(platform.live_tracks(), 1);
    }

    #[tokio::test]
    async fn test_ideal_facing_prefers_matching_camera() {
        let platform = SyntheticPlatform::phone();
        let rungs = ladder(FacingMode::Environment, &[]);
        let stream = platform.get_user_media(&rungs[1]).await.unwrap();
        assert_eq!(stream.video_settings().device_id.as_deref(), Some("back-0"));
    }

    #[tokio::test]
    async fn test_stop_tracks_releases_once() {
        let platform = SyntheticPlatform::phone();
        let mut stream = platform
            .get_user_media(&StreamConstraints::AnyVideo)
            .await
            .unwrap();
        assert_eq!(platform.live_tracks(), 1);
        assert_eq!(stream.stop_tracks(), 1);
        assert_eq!(stream.stop_tracks(), 0);
        assert_eq!(platform.live_tracks(), 0);
    }

    #[tokio::test]
    async fn test_empty_platform_has_no_devices() {
        let platform = SyntheticPlatform::new(Vec::new());
        let result = platform.get_user_media(&StreamConstraints::AnyVideo).await;
        assert_eq!(result.unwrap_err(), CameraError::NoDevices);
    }

    #[tokio::test]
    async fn test_sink_reports_dimensions_after_metadata() {
        let platform = SyntheticPlatform::new(vec![SyntheticCamera::webcam("w")]);
        let stream = platform
            .get_user_media(&StreamConstraints::AnyVideo)
            .await
            .unwrap();

        let handle = SyntheticSink::new();
        let mut sink = handle.clone();
        sink.attach(&stream);
        assert_eq!(sink.dimensions(), (0, 0));
        assert!(sink.current_frame().is_none());

        handle.advance(ReadyState::HaveMetadata);
        assert_eq!(sink.dimensions(), (640, 480));
        assert!(sink.current_frame().is_none());

        handle.advance(ReadyState::HaveEnoughData);
        let frame = sink.current_frame().unwrap();
        assert_eq!((frame.width, frame.height), (640, 480));
        assert!(frame.is_consistent());

        sink.detach();
        assert!(!handle.is_attached());
        assert_eq!(sink.ready_state(), ReadyState::HaveNothing);
    }

    #[test]
    fn test_split_pattern_halves() {
        let frame = split_pattern_frame(4, 1);
        assert_eq!(&frame.data[0..3], &[210, 60, 40]);
        assert_eq!(&frame.data[9..12], &[40, 60, 210]);
    }
}
