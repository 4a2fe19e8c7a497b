use serde::{Deserialize, Serialize};

use crate::errors::AirCastError;

// MARK: - Codec parameters

/// Opus encoder parameters for captured audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpusParams {
    #[serde(alias = "bitRate")]
    pub bit_rate: u32,
}

impl Default for OpusParams {
    fn default() -> Self {
        Self { bit_rate: 32_000 }
    }
}

/// VP8 encoder parameters for captured video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vp8Params {
    #[serde(alias = "bitRate")]
    pub bit_rate: u32,
}

impl Default for Vp8Params {
    fn default() -> Self {
        Self { bit_rate: 100_000 }
    }
}

// MARK: - Track constraints

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConstraints {
    pub opus: OpusParams,
}

/// Declarative video track constraints.
///
/// `width == 0` means "derive from the source aspect ratio" — the capture
/// backend scales to `height` keeping proportions, which is how the
/// screen-share demo requests 360p without knowing the display size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConstraints {
    pub width: u32,
    pub height: u32,
    pub vp8: Vp8Params,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self { width: 640, height: 480, vp8: Vp8Params::default() }
    }
}

impl VideoConstraints {
    /// Scale to a target height, keeping the source aspect ratio.
    pub fn scaled_to(height: u32) -> Self {
        Self { width: 0, height, ..Self::default() }
    }
}

// MARK: - MediaConstraints

/// Which tracks to request from the capture backend, and how to encode
/// them. Mirrors the browser `MediaStreamConstraints` shape: a track is
/// requested by making its entry `Some`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConstraints {
    pub audio: Option<AudioConstraints>,
    pub video: Option<VideoConstraints>,
}

impl MediaConstraints {
    /// Camera + microphone, as the `aircast-sender` demo uses.
    pub fn camera_and_microphone() -> Self {
        Self {
            audio: Some(AudioConstraints::default()),
            video: Some(VideoConstraints::default()),
        }
    }

    /// Screen capture scaled to 360p, video only.
    pub fn screen() -> Self {
        Self { audio: None, video: Some(VideoConstraints::scaled_to(360)) }
    }

    /// A constraint set that requests no tracks at all cannot negotiate
    /// anything; reject it before it reaches the peer connection.
    pub fn validate(&self) -> Result<(), AirCastError> {
        if self.audio.is_none() && self.video.is_none() {
            return Err(AirCastError::ConfigurationInvalid {
                reason: "constraints request neither audio nor video".into(),
            });
        }
        if let Some(video) = &self.video {
            if video.height == 0 {
                return Err(AirCastError::ConfigurationInvalid {
                    reason: "video height must be non-zero".into(),
                });
            }
        }
        Ok(())
    }
}

// MARK: - IceConfig

/// ICE servers handed to the peer connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IceConfig {
    pub stun_servers: Vec<String>,
}

impl Default for IceConfig {
    fn default() -> Self {
        Self { stun_servers: vec!["stun:stun.l.google.com:19302".into()] }
    }
}
