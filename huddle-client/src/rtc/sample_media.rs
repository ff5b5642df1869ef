use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use huddle_core::SignalingError;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

use crate::media::{
    FacingMode, LocalMedia, LocalTrack, MediaConstraints, MediaDevice, MediaSource, TrackKind,
};

const LOCAL_STREAM_ID: &str = "huddle-local";

/// Media source whose tracks are fed by the application through
/// [`LocalTrack::write_sample`] with already encoded frames.
pub struct SampleMediaSource {
    devices: Vec<MediaDevice>,
    next_track: AtomicU64,
}

impl SampleMediaSource {
    pub fn new(devices: Vec<MediaDevice>) -> Self {
        Self {
            devices,
            next_track: AtomicU64::new(0),
        }
    }

    fn pick_device(&self, constraints: &MediaConstraints) -> Result<&MediaDevice, SignalingError> {
        let device = match constraints {
            MediaConstraints::Device(id) => self.devices.iter().find(|d| d.device_id == *id),
            MediaConstraints::FacingMode(facing) => self
                .devices
                .iter()
                .find(|d| d.facing == Some(*facing))
                .or_else(|| self.devices.first()),
        };
        device.ok_or_else(|| {
            SignalingError::MediaUnavailable(format!("no video input matches {:?}", constraints))
        })
    }

    fn track_id(&self, kind: &str) -> String {
        let n = self.next_track.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", kind, n)
    }
}

impl Default for SampleMediaSource {
    fn default() -> Self {
        Self::new(vec![
            MediaDevice {
                device_id: "front".into(),
                label: "Front camera".into(),
                facing: Some(FacingMode::User),
            },
            MediaDevice {
                device_id: "back".into(),
                label: "Back camera".into(),
                facing: Some(FacingMode::Environment),
            },
        ])
    }
}

#[async_trait]
impl MediaSource for SampleMediaSource {
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<LocalMedia, SignalingError> {
        let device = self.pick_device(constraints)?;

        let audio = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            self.track_id("audio"),
            LOCAL_STREAM_ID.to_owned(),
        ));
        let video = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
            self.track_id("video"),
            LOCAL_STREAM_ID.to_owned(),
        ));

        Ok(LocalMedia::new(vec![
            LocalTrack::new(TrackKind::Audio, None, audio),
            LocalTrack::new(TrackKind::Video, Some(device.device_id.clone()), video),
        ]))
    }

    async fn video_inputs(&self) -> Result<Vec<MediaDevice>, SignalingError> {
        Ok(self.devices.clone())
    }
}
