//! Camera session: device discovery, stream lifecycle, readiness and capture.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::constraints::{ladder, StreamConstraints};
use super::frame_utils::{encode_jpeg, mirror_horizontal, JPEG_QUALITY};
use super::platform::{MediaPlatform, MediaStream, SinkEvent, VideoSink};
use super::state::{CameraStatus, SessionEvent};
use super::types::{
    CameraDevice, CameraError, CaptureError, CapturedFrame, DeviceKind, FacingMode, ReadyState,
};

/// Delay before readiness is re-checked when no sink event arrived.
pub const DEFAULT_READY_FALLBACK: Duration = Duration::from_secs(2);

/// Tunables for a camera session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Facing mode used before any start request
    pub initial_facing: FacingMode,
    /// Delay for [`CameraSession::readiness_fallback`]
    pub ready_fallback: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            initial_facing: FacingMode::default(),
            ready_fallback: DEFAULT_READY_FALLBACK,
        }
    }
}

struct SessionInner<S: MediaStream> {
    status: CameraStatus,
    facing: FacingMode,
    devices: Vec<CameraDevice>,
    stream: Option<S>,
    sink: Option<Box<dyn VideoSink<S>>>,
    video_ready: bool,
    /// Bumped by every start and stop; acquisitions from older generations are discarded
    generation: u64,
    unsupported_reported: bool,
}

impl<S: MediaStream> SessionInner<S> {
    fn apply(&mut self, event: SessionEvent) {
        let next = self.status.apply(event);
        if next != self.status {
            log::debug!("Camera status {} -> {}", self.status, next);
            self.status = next;
        }
    }

    /// Stop every track, detach the sink and clear readiness. Leaves status alone.
    fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let stopped = stream.stop_tracks();
            log::info!("Stopped {} camera track(s) on stream {}", stopped, stream.id());
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.detach();
        }
        self.video_ready = false;
    }

    /// Declare readiness if the sink has non-zero frame dimensions.
    fn mark_ready_if_sized(&mut self, event: SessionEvent) -> bool {
        if self.stream.is_none() {
            return false;
        }
        let (width, height) = match self.sink.as_ref() {
            Some(sink) => sink.dimensions(),
            None => return false,
        };
        if width == 0 || height == 0 {
            return false;
        }
        if !self.video_ready {
            log::info!("Video ready at {}x{}", width, height);
        }
        self.video_ready = true;
        self.apply(event);
        true
    }
}

impl<S: MediaStream> Drop for SessionInner<S> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Fails a start whose future is dropped while acquisition is pending.
struct PendingStart<'a, S: MediaStream> {
    inner: &'a Mutex<SessionInner<S>>,
    generation: u64,
    armed: bool,
}

impl<S: MediaStream> Drop for PendingStart<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.generation == self.generation {
            log::warn!("Camera start cancelled while requesting a stream");
            inner.generation += 1;
            inner.apply(SessionEvent::Failed);
        }
    }
}

/// Handle to a camera session.
///
/// Clones share the same session. At most one stream is live at any time;
/// starting again releases the previous stream before requesting a new one.
pub struct CameraSession<P: MediaPlatform> {
    platform: Arc<P>,
    inner: Arc<Mutex<SessionInner<P::Stream>>>,
    settings: SessionSettings,
}

impl<P: MediaPlatform> Clone for CameraSession<P> {
    fn clone(&self) -> Self {
        Self {
            platform: Arc::clone(&self.platform),
            inner: Arc::clone(&self.inner),
            settings: self.settings.clone(),
        }
    }
}

impl<P: MediaPlatform> std::fmt::Debug for CameraSession<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("CameraSession")
            .field("status", &inner.status)
            .field("facing", &inner.facing)
            .field("video_ready", &inner.video_ready)
            .field("generation", &inner.generation)
            .finish_non_exhaustive()
    }
}

impl<P: MediaPlatform> CameraSession<P> {
    pub fn new(platform: P) -> Self {
        Self::with_settings(Arc::new(platform), SessionSettings::default())
    }

    pub fn with_settings(platform: Arc<P>, settings: SessionSettings) -> Self {
        let inner = SessionInner {
            status: CameraStatus::Initializing,
            facing: settings.initial_facing,
            devices: Vec::new(),
            stream: None,
            sink: None,
            video_ready: false,
            generation: 0,
            unsupported_reported: false,
        };
        Self {
            platform,
            inner: Arc::new(Mutex::new(inner)),
            settings,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner<P::Stream>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn status(&self) -> CameraStatus {
        self.lock().status
    }

    pub fn facing_mode(&self) -> FacingMode {
        self.lock().facing
    }

    pub fn devices(&self) -> Vec<CameraDevice> {
        self.lock().devices.clone()
    }

    pub fn is_video_ready(&self) -> bool {
        self.lock().video_ready
    }

    pub fn has_active_stream(&self) -> bool {
        self.lock().stream.is_some()
    }

    pub fn active_stream_id(&self) -> Option<String> {
        self.lock().stream.as_ref().map(|s| s.id().to_string())
    }

    /// Bind the preview sink, attaching the current stream if there is one.
    pub fn bind_sink(&self, sink: impl VideoSink<P::Stream> + 'static) {
        let mut inner = self.lock();
        let mut sink: Box<dyn VideoSink<P::Stream>> = Box::new(sink);
        if let Some(old) = inner.sink.as_mut() {
            old.detach();
        }
        if let Some(stream) = inner.stream.as_ref() {
            sink.attach(stream);
        }
        inner.sink = Some(sink);
    }

    /// Query the platform for video inputs.
    ///
    /// Never fails: unsupported platforms and failed queries yield an empty
    /// list. Labels may be empty until permission has been granted.
    pub async fn enumerate_devices(&self) -> Vec<CameraDevice> {
        if !self.platform.is_supported() {
            log::warn!("Camera enumeration skipped: media capture not supported");
            return Vec::new();
        }

        let devices: Vec<CameraDevice> = match self.platform.enumerate_devices().await {
            Ok(all) => all
                .into_iter()
                .filter(|d| d.kind == DeviceKind::VideoInput)
                .collect(),
            Err(e) => {
                log::warn!("Error getting camera devices: {}", e);
                Vec::new()
            }
        };
        log::info!("Available cameras: {}", devices.len());

        let mut inner = self.lock();
        if self.platform.is_mobile()
            && devices.len() > 1
            && devices.iter().any(CameraDevice::looks_rear_facing)
        {
            inner.facing = FacingMode::Environment;
        }
        inner.devices = devices.clone();
        devices
    }

    /// Start the camera with the given facing mode.
    ///
    /// Any existing stream is released first. Constraints are tried from the
    /// most to the least specific; the first stream that opens wins and the
    /// recorded facing mode follows what the platform actually negotiated.
    ///
    /// # Errors
    /// * `CameraError::Unsupported` - The platform has no capture API
    /// * `CameraError::Superseded` - A newer start or stop happened while this
    ///   request was pending; its stream has already been released
    /// * Any platform error from the last constraint attempt
    ///
    /// Dropping the returned future before it resolves leaves no stream open
    /// and moves the session to `Error`.
    pub async fn start(&self, facing: FacingMode) -> Result<(), CameraError> {
        let (generation, rungs) = {
            let mut inner = self.lock();
            inner.apply(SessionEvent::StartRequested);
            log::info!("Starting camera with facing mode: {}", facing);

            if !self.platform.is_supported() {
                if !inner.unsupported_reported {
                    log::error!("Camera not supported on this platform");
                    inner.unsupported_reported = true;
                }
                inner.apply(SessionEvent::Failed);
                return Err(CameraError::Unsupported);
            }

            inner.release();
            inner.generation += 1;
            inner.facing = facing;
            inner.apply(SessionEvent::DevicesQueried);
            inner.apply(SessionEvent::StreamRequested);
            (inner.generation, ladder(facing, &inner.devices))
        };

        let mut pending = PendingStart {
            inner: &self.inner,
            generation,
            armed: true,
        };
        let acquired = self.acquire(&rungs).await;
        pending.armed = false;

        let mut inner = self.lock();
        if inner.generation != generation {
            if let Ok(mut stale) = acquired {
                stale.stop_tracks();
                log::info!("Discarded stream {} from superseded start", stale.id());
            }
            return Err(CameraError::Superseded);
        }

        let stream = match acquired {
            Ok(stream) => stream,
            Err(e) => {
                log::error!("Camera initialization error: {}", e);
                inner.apply(SessionEvent::Failed);
                return Err(e);
            }
        };

        let settings = stream.video_settings();
        if let Some(actual) = settings.facing_mode {
            if actual != facing {
                log::info!("Requested {} camera, platform provided {}", facing, actual);
            }
            inner.facing = actual;
        }

        inner.apply(SessionEvent::StreamAcquired);
        inner.video_ready = false;
        if let Some(sink) = inner.sink.as_mut() {
            sink.attach(&stream);
        }
        inner.stream = Some(stream);
        Ok(())
    }

    async fn acquire(&self, rungs: &[StreamConstraints]) -> Result<P::Stream, CameraError> {
        let mut last_error = CameraError::StreamFailed("Failed to get camera stream".to_string());

        for (i, constraints) in rungs.iter().enumerate() {
            log::debug!("Trying camera constraint {}: {}", i + 1, constraints);
            match self.platform.get_user_media(constraints).await {
                Ok(stream) => {
                    log::info!("Camera stream obtained with constraint {}", i + 1);
                    return Ok(stream);
                }
                Err(e) => {
                    log::debug!("Camera constraint {} failed: {}", i + 1, e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    /// Toggle between front and back cameras.
    pub async fn switch_camera(&self) -> Result<(), CameraError> {
        let next = self.facing_mode().toggled();
        log::info!("Switching camera to {}", next);
        self.start(next).await
    }

    /// Feed a sink readiness signal. Returns whether the session is ready.
    ///
    /// Every signal goes through the same idempotent check, so the order in
    /// which platforms fire them does not matter.
    pub fn handle_sink_event(&self, event: SinkEvent) -> bool {
        let mut inner = self.lock();
        let event = match event {
            SinkEvent::LoadedMetadata => SessionEvent::MetadataLoaded,
            SinkEvent::CanPlay | SinkEvent::Playing => SessionEvent::Playable,
        };
        inner.mark_ready_if_sized(event)
    }

    /// Wait for the fallback delay, then declare readiness if the sink has
    /// frames but no event did so. Returns whether this call marked the session ready.
    pub async fn readiness_fallback(&self) -> bool {
        let generation = self.lock().generation;
        tokio::time::sleep(self.settings.ready_fallback).await;

        let mut inner = self.lock();
        if inner.generation != generation || inner.video_ready {
            return false;
        }
        let marked = inner.mark_ready_if_sized(SessionEvent::Playable);
        if marked {
            log::info!("Video readiness declared by fallback check");
        }
        marked
    }

    /// Take a still from the current frame.
    ///
    /// Front-camera stills are mirrored to match the mirrored live preview.
    /// Failures leave the session status untouched, so the caller may retry.
    pub fn capture(&self) -> Result<CapturedFrame, CaptureError> {
        let inner = self.lock();
        let sink = inner.sink.as_ref().ok_or(CaptureError::NoSink)?;

        if sink.ready_state() < ReadyState::HaveCurrentData {
            return Err(CaptureError::NotReady);
        }
        let (width, height) = sink.dimensions();
        if width == 0 || height == 0 {
            return Err(CaptureError::ZeroDimensions);
        }

        let mut frame = sink.current_frame().ok_or(CaptureError::NoFrame)?;
        let mirrored = inner.facing == FacingMode::User;
        if mirrored {
            mirror_horizontal(&mut frame);
        }

        let jpeg = encode_jpeg(&frame, JPEG_QUALITY)?;
        log::info!(
            "Captured {}x{} still ({} bytes{})",
            frame.width,
            frame.height,
            jpeg.len(),
            if mirrored { ", mirrored" } else { "" }
        );

        Ok(CapturedFrame {
            jpeg,
            width: frame.width,
            height: frame.height,
            mirrored,
        })
    }

    /// Release the stream and sink. Safe to call any number of times.
    pub fn stop(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.release();
        inner.apply(SessionEvent::Stopped);
    }
}
