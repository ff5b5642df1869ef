//! Local capture: tracks, their enabled flags and the source that produces them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use huddle_core::SignalingError;
use webrtc::media::Sample;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    #[default]
    User,
    Environment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaConstraints {
    FacingMode(FacingMode),
    /// A specific video input, as listed by [`MediaSource::video_inputs`].
    Device(String),
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self::FacingMode(FacingMode::User)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDevice {
    pub device_id: String,
    pub label: String,
    pub facing: Option<FacingMode>,
}

/// A captured track. Clones share the enabled and stopped flags.
#[derive(Clone)]
pub struct LocalTrack {
    id: String,
    kind: TrackKind,
    device_id: Option<String>,
    enabled: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    sink: Option<Arc<TrackLocalStaticSample>>,
}

impl std::fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("device_id", &self.device_id)
            .field("enabled", &self.is_enabled())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl LocalTrack {
    /// A track backed by a webrtc sample writer.
    pub fn new(
        kind: TrackKind,
        device_id: Option<String>,
        sink: Arc<TrackLocalStaticSample>,
    ) -> Self {
        use webrtc::track::track_local::TrackLocal;

        Self {
            id: sink.id().to_owned(),
            kind,
            device_id,
            enabled: Arc::new(AtomicBool::new(true)),
            stopped: Arc::new(AtomicBool::new(false)),
            sink: Some(sink),
        }
    }

    /// A track with no media behind it.
    pub fn detached(id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            kind,
            device_id: None,
            enabled: Arc::new(AtomicBool::new(true)),
            stopped: Arc::new(AtomicBool::new(false)),
            sink: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn sink(&self) -> Option<&Arc<TrackLocalStaticSample>> {
        self.sink.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    /// Feeds one encoded frame. Frames of disabled or stopped tracks are dropped.
    pub async fn write_sample(&self, data: Bytes, duration: Duration) -> anyhow::Result<()> {
        if !self.is_enabled() || self.is_stopped() {
            return Ok(());
        }
        if let Some(sink) = &self.sink {
            sink.write_sample(&Sample {
                data,
                duration,
                ..Default::default()
            })
            .await?;
        }
        Ok(())
    }
}

/// Tracks obtained from one `acquire` call.
#[derive(Debug, Clone, Default)]
pub struct LocalMedia {
    tracks: Vec<LocalTrack>,
}

impl LocalMedia {
    pub fn new(tracks: Vec<LocalTrack>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn audio(&self) -> Option<&LocalTrack> {
        self.tracks.iter().find(|t| t.kind() == TrackKind::Audio)
    }

    pub fn video(&self) -> Option<&LocalTrack> {
        self.tracks.iter().find(|t| t.kind() == TrackKind::Video)
    }

    /// Puts `track` in place of the current video track and returns the old one.
    pub fn set_video(&mut self, track: LocalTrack) -> Option<LocalTrack> {
        let old = self
            .tracks
            .iter()
            .position(|t| t.kind() == TrackKind::Video)
            .map(|i| self.tracks.remove(i));
        self.tracks.push(track);
        old
    }

    pub fn set_audio_enabled(&self, enabled: bool) {
        for track in self.tracks.iter().filter(|t| t.kind() == TrackKind::Audio) {
            track.set_enabled(enabled);
        }
    }

    /// Returns whether audio is enabled afterwards.
    pub fn toggle_audio(&self) -> bool {
        let enabled = !self.audio().is_some_and(LocalTrack::is_enabled);
        self.set_audio_enabled(enabled);
        enabled
    }

    /// Returns whether video is enabled afterwards.
    pub fn toggle_video(&self) -> bool {
        let enabled = !self.video().is_some_and(LocalTrack::is_enabled);
        for track in self.tracks.iter().filter(|t| t.kind() == TrackKind::Video) {
            track.set_enabled(enabled);
        }
        enabled
    }

    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

/// Camera and microphone access.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Fails with [`SignalingError::MediaUnavailable`] when capture is denied or
    /// no device matches.
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<LocalMedia, SignalingError>;

    async fn video_inputs(&self) -> Result<Vec<MediaDevice>, SignalingError>;
}
