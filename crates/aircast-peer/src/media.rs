//! Capture backend seam.
//!
//! Real capture and encoding live outside this workspace; the demos only
//! declare *what* they want (tracks, resolution, codec bit rates) through
//! [`MediaConstraints`] and receive attachable local tracks back. Swapping in
//! a real camera/screen backend means implementing [`MediaSource`] — nothing
//! above this seam changes.

use std::sync::Arc;

use aircast_core::{MediaConstraints, PeerError};
use async_trait::async_trait;
use tracing::debug;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_local::TrackLocal;

/// Media stream id shared by all tracks of one source.
const STREAM_ID: &str = "aircast";

/// A local track ready to be attached to a peer connection.
pub type LocalTrack = Arc<dyn TrackLocal + Send + Sync>;

// ── MediaSource ──────────────────────────────────────────────────────────────

/// Produces local tracks from a declarative constraint set.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Camera + microphone tracks.
    async fn user_media(&self, constraints: &MediaConstraints) -> Result<Vec<LocalTrack>, PeerError>;

    /// Screen capture tracks (video only — displays have no microphone).
    async fn display_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Vec<LocalTrack>, PeerError>;
}

// ── StaticSource ─────────────────────────────────────────────────────────────

/// Negotiation-only source: creates Opus/VP8 tracks with the constrained
/// codec capabilities but feeds no frames. Enough to drive the full SDP
/// exchange, which is all these demos transport.
#[derive(Debug, Default)]
pub struct StaticSource;

#[async_trait]
impl MediaSource for StaticSource {
    async fn user_media(&self, constraints: &MediaConstraints) -> Result<Vec<LocalTrack>, PeerError> {
        validate(constraints)?;
        let mut tracks: Vec<LocalTrack> = Vec::new();

        if let Some(audio) = &constraints.audio {
            debug!("Audio track requested: Opus @ {} bps", audio.opus.bit_rate);
            tracks.push(Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_OPUS.to_owned(),
                    clock_rate: 48_000,
                    channels: 2,
                    ..Default::default()
                },
                "audio".to_owned(),
                STREAM_ID.to_owned(),
            )));
        }

        if let Some(video) = &constraints.video {
            debug!(
                "Video track requested: VP8 @ {} bps, {}x{}",
                video.vp8.bit_rate, video.width, video.height
            );
            tracks.push(video_track());
        }

        Ok(tracks)
    }

    async fn display_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Vec<LocalTrack>, PeerError> {
        validate(constraints)?;
        if constraints.audio.is_some() {
            debug!("Display capture ignores audio constraints");
        }
        let video = constraints.video.as_ref().ok_or_else(|| PeerError::Track {
            reason: "display capture needs video constraints".into(),
        })?;
        debug!(
            "Display track requested: VP8 @ {} bps, scaled to {}p",
            video.vp8.bit_rate, video.height
        );
        Ok(vec![video_track()])
    }
}

fn video_track() -> LocalTrack {
    Arc::new(TrackLocalStaticSample::new(
        RTCRtpCodecCapability {
            mime_type: MIME_TYPE_VP8.to_owned(),
            clock_rate: 90_000,
            ..Default::default()
        },
        "video".to_owned(),
        STREAM_ID.to_owned(),
    ))
}

fn validate(constraints: &MediaConstraints) -> Result<(), PeerError> {
    constraints
        .validate()
        .map_err(|e| PeerError::Track { reason: e.to_string() })
}

#[cfg(test)]
mod tests {
    use aircast_core::MediaConstraints;

    use super::{MediaSource, StaticSource};

    #[tokio::test]
    async fn user_media_yields_audio_and_video() {
        let tracks = StaticSource
            .user_media(&MediaConstraints::camera_and_microphone())
            .await
            .expect("tracks");
        assert_eq!(tracks.len(), 2);
        let ids: Vec<_> = tracks.iter().map(|t| t.id().to_string()).collect();
        assert!(ids.contains(&"audio".to_string()));
        assert!(ids.contains(&"video".to_string()));
    }

    #[tokio::test]
    async fn display_media_is_video_only() {
        let tracks = StaticSource
            .display_media(&MediaConstraints::screen())
            .await
            .expect("tracks");
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id(), "video");
    }

    #[tokio::test]
    async fn empty_constraints_fail() {
        assert!(StaticSource
            .user_media(&MediaConstraints::default())
            .await
            .is_err());
        assert!(StaticSource
            .display_media(&MediaConstraints {
                audio: None,
                video: None
            })
            .await
            .is_err());
    }
}
