//! CLI enum types.

use clap::ValueEnum;

use leafsnap::camera::synthetic::{SyntheticCamera, SyntheticPlatform};

/// Simulated camera hardware for `simulate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Rig {
    /// Phone with front and back cameras
    #[default]
    Phone,
    /// Device with only a front camera
    FrontOnly,
    /// Desktop webcam that reports no facing mode
    Webcam,
    /// Platform without camera support
    Unsupported,
}

impl Rig {
    pub fn platform(self) -> SyntheticPlatform {
        match self {
            Rig::Phone => SyntheticPlatform::phone(),
            Rig::FrontOnly => SyntheticPlatform::new(vec![SyntheticCamera::front("front-0")]),
            Rig::Webcam => SyntheticPlatform::new(vec![SyntheticCamera::webcam("usb-0")]),
            Rig::Unsupported => SyntheticPlatform::unsupported(),
        }
    }
}
