//! Stream constraints and the acquisition ladder.
//!
//! Support for exact facing-mode constraints varies widely between cameras
//! and drivers, so acquisition walks from the most specific request down to
//! "any video input" and keeps the first stream that opens.

use std::fmt;

use super::types::{CameraDevice, FacingMode};

/// A numeric constraint with a preferred value and a hard lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub ideal: u32,
    pub min: u32,
}

impl Range {
    pub const fn new(ideal: u32, min: u32) -> Self {
        Self { ideal, min }
    }

    /// Whether a native value satisfies the lower bound.
    pub fn admits(&self, value: u32) -> bool {
        value >= self.min
    }
}

/// How strictly a facing mode is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingConstraint {
    /// Fail unless the camera faces this way
    Exact(FacingMode),
    /// Prefer this camera but accept any other
    Ideal(FacingMode),
}

/// Video track constraints for a single acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConstraints {
    pub facing_mode: Option<FacingConstraint>,
    /// Exact device id
    pub device_id: Option<String>,
    pub width: Option<Range>,
    pub height: Option<Range>,
    pub frame_rate: Option<Range>,
}

/// One rung of the constraint ladder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamConstraints {
    Video(VideoConstraints),
    /// Unconstrained: any video input will do
    AnyVideo,
}

/// High-resolution bounds shared by the exact-facing and per-device rungs.
pub const HIGH_WIDTH: Range = Range::new(1280, 640);
pub const HIGH_HEIGHT: Range = Range::new(720, 480);
pub const HIGH_FRAME_RATE: Range = Range::new(30, 15);

/// Relaxed bounds for the ideal-facing rung.
pub const LOW_WIDTH: Range = Range::new(640, 320);
pub const LOW_HEIGHT: Range = Range::new(480, 240);

/// Build the ordered acquisition attempts for a facing mode.
///
/// Order: exact facing at high resolution, ideal facing at lower
/// resolution, one attempt per known device id, then any video input.
pub fn ladder(facing: FacingMode, devices: &[CameraDevice]) -> Vec<StreamConstraints> {
    let mut rungs = Vec::with_capacity(devices.len() + 3);

    rungs.push(StreamConstraints::Video(VideoConstraints {
        facing_mode: Some(FacingConstraint::Exact(facing)),
        device_id: None,
        width: Some(HIGH_WIDTH),
        height: Some(HIGH_HEIGHT),
        frame_rate: Some(HIGH_FRAME_RATE),
    }));

    rungs.push(StreamConstraints::Video(VideoConstraints {
        facing_mode: Some(FacingConstraint::Ideal(facing)),
        device_id: None,
        width: Some(LOW_WIDTH),
        height: Some(LOW_HEIGHT),
        frame_rate: None,
    }));

    rungs.extend(devices.iter().map(|device| {
        StreamConstraints::Video(VideoConstraints {
            facing_mode: None,
            device_id: Some(device.device_id.clone()),
            width: Some(HIGH_WIDTH),
            height: Some(HIGH_HEIGHT),
            frame_rate: None,
        })
    }));

    rungs.push(StreamConstraints::AnyVideo);
    rungs
}

impl fmt::Display for StreamConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamConstraints::AnyVideo => write!(f, "video: any"),
            StreamConstraints::Video(v) => {
                let mut parts = Vec::new();
                match v.facing_mode {
                    Some(FacingConstraint::Exact(m)) => parts.push(format!("facingMode exact {}", m)),
                    Some(FacingConstraint::Ideal(m)) => parts.push(format!("facingMode ideal {}", m)),
                    None => {}
                }
                if let Some(id) = &v.device_id {
                    parts.push(format!("deviceId {}", id));
                }
                if let (Some(w), Some(h)) = (v.width, v.height) {
                    parts.push(format!(
                        "{}x{} (min {}x{})",
                        w.ideal, h.ideal, w.min, h.min
                    ));
                }
                if let Some(fps) = v.frame_rate {
                    parts.push(format!("{}fps (min {})", fps.ideal, fps.min));
                }
                write!(f, "video: {}", parts.join(", "))
            }
        }
    }
}
