//! Session status and its transition function.

use std::fmt;

/// Lifecycle status of a camera session, as consumed by the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraStatus {
    #[default]
    Initializing,
    RequestingPermission,
    GettingDevices,
    RequestingStream,
    SettingUpVideo,
    VideoReady,
    Ready,
    Error,
    Stopped,
}

/// Inputs that drive [`CameraStatus::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    StartRequested,
    DevicesQueried,
    StreamRequested,
    StreamAcquired,
    /// Sink reported metadata with non-zero dimensions
    MetadataLoaded,
    /// Sink can play or started playing, with non-zero dimensions
    Playable,
    Failed,
    Stopped,
}

impl CameraStatus {
    /// Wire name used by the UI layer.
    pub fn as_str(self) -> &'static str {
        match self {
            CameraStatus::Initializing => "initializing",
            CameraStatus::RequestingPermission => "requesting_permission",
            CameraStatus::GettingDevices => "getting_devices",
            CameraStatus::RequestingStream => "requesting_stream",
            CameraStatus::SettingUpVideo => "setting_up_video",
            CameraStatus::VideoReady => "video_ready",
            CameraStatus::Ready => "ready",
            CameraStatus::Error => "error",
            CameraStatus::Stopped => "stopped",
        }
    }

    /// Whether a stream request is in flight.
    pub fn is_in_flight(self) -> bool {
        matches!(
            self,
            CameraStatus::RequestingPermission
                | CameraStatus::GettingDevices
                | CameraStatus::RequestingStream
                | CameraStatus::SettingUpVideo
        )
    }

    /// Whether the live video has usable frames.
    pub fn is_live(self) -> bool {
        matches!(self, CameraStatus::VideoReady | CameraStatus::Ready)
    }

    /// Compute the next status for an event.
    ///
    /// Events that make no sense in the current status leave it unchanged.
    pub fn apply(self, event: SessionEvent) -> CameraStatus {
        use CameraStatus as S;
        use SessionEvent as E;

        match (self, event) {
            (_, E::StartRequested) => S::RequestingPermission,
            (_, E::Stopped) => S::Stopped,

            (S::RequestingPermission, E::DevicesQueried) => S::GettingDevices,
            (S::RequestingPermission | S::GettingDevices, E::StreamRequested) => {
                S::RequestingStream
            }
            (S::RequestingStream, E::StreamAcquired) => S::SettingUpVideo,

            (S::SettingUpVideo, E::MetadataLoaded) => S::VideoReady,
            (S::SettingUpVideo | S::VideoReady, E::Playable) => S::Ready,

            (status, E::Failed) if status.is_in_flight() => S::Error,
            // Unsupported platforms fail before anything else happens
            (S::Initializing, E::Failed) => S::Error,

            (status, _) => status,
        }
    }
}

impl fmt::Display for CameraStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(events: &[SessionEvent]) -> CameraStatus {
        events
            .iter()
            .fold(CameraStatus::default(), |status, event| status.apply(*event))
    }

    #[test]
    fn test_wire_names() {
        let all = [
            CameraStatus::Initializing,
            CameraStatus::RequestingPermission,
            CameraStatus::GettingDevices,
            CameraStatus::RequestingStream,
            CameraStatus::SettingUpVideo,
            CameraStatus::VideoReady,
            CameraStatus::Ready,
            CameraStatus::Error,
            CameraStatus::Stopped,
        ];
        let names: Vec<&str> = all.iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names.join("|"),
            "initializing|requesting_permission|getting_devices|requesting_stream|setting_up_video|video_ready|ready|error|stopped"
        );
    }

    #[test]
    fn test_happy_path_reaches_ready() {
        let status = run(&[
            SessionEvent::StartRequested,
            SessionEvent::DevicesQueried,
            SessionEvent::StreamRequested,
            SessionEvent::StreamAcquired,
            SessionEvent::MetadataLoaded,
            SessionEvent::Playable,
        ]);
        assert_eq!(status, CameraStatus::Ready);
    }

    #[test]
    fn test_metadata_alone_gives_video_ready() {
        let status = run(&[
            SessionEvent::StartRequested,
            SessionEvent::StreamRequested,
            SessionEvent::StreamAcquired,
            SessionEvent::MetadataLoaded,
        ]);
        assert_eq!(status, CameraStatus::VideoReady);
    }

    #[test]
    fn test_readiness_events_are_idempotent() {
        let ready = run(&[
            SessionEvent::StartRequested,
            SessionEvent::StreamRequested,
            SessionEvent::StreamAcquired,
            SessionEvent::Playable,
        ]);
        assert_eq!(ready, CameraStatus::Ready);
        assert_eq!(ready.apply(SessionEvent::MetadataLoaded), CameraStatus::Ready);
        assert_eq!(ready.apply(SessionEvent::Playable), CameraStatus::Ready);
    }

    #[test]
    fn test_failure_from_in_flight_state() {
        for status in [
            CameraStatus::RequestingPermission,
            CameraStatus::GettingDevices,
            CameraStatus::RequestingStream,
            CameraStatus::SettingUpVideo,
        ] {
            assert_eq!(status.apply(SessionEvent::Failed), CameraStatus::Error);
        }
    }

    #[test]
    fn test_failure_does_not_disturb_live_session() {
        assert_eq!(
            CameraStatus::Ready.apply(SessionEvent::Failed),
            CameraStatus::Ready
        );
    }

    #[test]
    fn test_stopped_only_leaves_on_start() {
        let events = [
            SessionEvent::DevicesQueried,
            SessionEvent::StreamRequested,
            SessionEvent::StreamAcquired,
            SessionEvent::MetadataLoaded,
            SessionEvent::Playable,
            SessionEvent::Failed,
            SessionEvent::Stopped,
        ];
        for event in events {
            assert_eq!(CameraStatus::Stopped.apply(event), CameraStatus::Stopped);
        }
        assert_eq!(
            CameraStatus::Stopped.apply(SessionEvent::StartRequested),
            CameraStatus::RequestingPermission
        );
    }

    #[test]
    fn test_any_state_can_stop() {
        assert_eq!(
            CameraStatus::Error.apply(SessionEvent::Stopped),
            CameraStatus::Stopped
        );
        assert_eq!(
            CameraStatus::RequestingStream.apply(SessionEvent::Stopped),
            CameraStatus::Stopped
        );
    }
}
