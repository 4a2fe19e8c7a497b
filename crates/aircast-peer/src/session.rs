//! Peer connection lifecycle: create, negotiate, tear down.

use std::sync::Arc;

use aircast_core::{IceConfig, PeerError, SdpKind, SessionDescription};
use tracing::{debug, info};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{APIBuilder, API};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::track::track_local::TrackLocal;

// ── Description conversions ──────────────────────────────────────────────────

/// Rebuild the `webrtc` description type from a signaling value.
pub fn to_rtc(description: &SessionDescription) -> Result<RTCSessionDescription, PeerError> {
    let sdp = description.sdp.clone();
    let rtc = match description.kind {
        SdpKind::Offer => RTCSessionDescription::offer(sdp),
        SdpKind::Answer => RTCSessionDescription::answer(sdp),
        SdpKind::Pranswer => RTCSessionDescription::pranswer(sdp),
        SdpKind::Rollback => {
            return Err(PeerError::InvalidDescription {
                reason: "rollback never crosses the signaling channel".into(),
            })
        }
    };
    rtc.map_err(|e| PeerError::InvalidDescription { reason: e.to_string() })
}

/// Turn the `webrtc` description into a signaling value.
pub fn from_rtc(rtc: RTCSessionDescription) -> Result<SessionDescription, PeerError> {
    let kind = match rtc.sdp_type {
        RTCSdpType::Offer => SdpKind::Offer,
        RTCSdpType::Answer => SdpKind::Answer,
        RTCSdpType::Pranswer => SdpKind::Pranswer,
        RTCSdpType::Rollback => SdpKind::Rollback,
        RTCSdpType::Unspecified => {
            return Err(PeerError::InvalidDescription {
                reason: "description has no sdp type".into(),
            })
        }
    };
    Ok(SessionDescription::new(kind, rtc.sdp))
}

// ── Engine ───────────────────────────────────────────────────────────────────

fn build_api() -> Result<API, PeerError> {
    let mut media_engine = MediaEngine::default();
    media_engine
        .register_default_codecs()
        .map_err(|e| PeerError::Engine { reason: e.to_string() })?;

    let mut registry = Registry::new();
    registry = register_default_interceptors(registry, &mut media_engine)
        .map_err(|e| PeerError::Engine { reason: e.to_string() })?;

    Ok(APIBuilder::new()
        .with_media_engine(media_engine)
        .with_interceptor_registry(registry)
        .build())
}

// ── PeerSession ──────────────────────────────────────────────────────────────

/// One peer connection plus the negotiation operations the demos need.
///
/// Descriptions go in and out as signaling values; local tracks go in as a
/// batch of send-only transceivers.
pub struct PeerSession {
    pc: Arc<RTCPeerConnection>,
}

impl PeerSession {
    /// Build the media engine and open a peer connection against `ice`.
    pub async fn connect(ice: &IceConfig) -> Result<Self, PeerError> {
        let api = build_api()?;

        let config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: ice.stun_servers.clone(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let pc = Arc::new(
            api.new_peer_connection(config)
                .await
                .map_err(|e| PeerError::Engine { reason: e.to_string() })?,
        );

        pc.on_ice_connection_state_change(Box::new(|state: RTCIceConnectionState| {
            info!("ICE connection state changed: {state}");
            Box::pin(async {})
        }));
        pc.on_peer_connection_state_change(Box::new(|state: RTCPeerConnectionState| {
            info!("Peer connection state changed: {state}");
            Box::pin(async {})
        }));

        Ok(Self { pc })
    }

    /// Attach local tracks as send-only transceivers.
    pub async fn add_send_tracks(
        &self,
        tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
    ) -> Result<(), PeerError> {
        for track in tracks {
            let init = RTCRtpTransceiverInit {
                direction: RTCRtpTransceiverDirection::Sendonly,
                send_encodings: vec![],
            };
            self.pc
                .add_transceiver_from_track(track, Some(init))
                .await
                .map_err(|e| PeerError::Track { reason: e.to_string() })?;
        }
        Ok(())
    }

    /// Log tracks the remote side negotiates toward us. Receive-side demos
    /// register this before applying the offer.
    pub fn log_incoming_tracks(&self) {
        self.pc.on_track(Box::new(|track, _receiver, _transceiver| {
            info!(
                "Remote track negotiated: id={} kind={}",
                track.id(),
                track.kind()
            );
            Box::pin(async {})
        }));
    }

    /// Create an offer, install it locally, and wait for ICE gathering so the
    /// returned description carries every candidate.
    pub async fn create_offer(&self) -> Result<SessionDescription, PeerError> {
        let offer = self
            .pc
            .create_offer(None)
            .await
            .map_err(|e| PeerError::Negotiation { reason: e.to_string() })?;
        self.install_local(offer).await
    }

    /// Create an answer for a previously applied remote offer.
    pub async fn create_answer(&self) -> Result<SessionDescription, PeerError> {
        let answer = self
            .pc
            .create_answer(None)
            .await
            .map_err(|e| PeerError::Negotiation { reason: e.to_string() })?;
        self.install_local(answer).await
    }

    async fn install_local(
        &self,
        description: RTCSessionDescription,
    ) -> Result<SessionDescription, PeerError> {
        let mut gathering_done = self.pc.gathering_complete_promise().await;
        self.pc
            .set_local_description(description)
            .await
            .map_err(|e| PeerError::Negotiation { reason: e.to_string() })?;

        // Non-trickle: the HTTP exchange carries one document each way, so
        // wait for the candidate set to be complete before shipping it.
        let _ = gathering_done.recv().await;

        let local = self.pc.local_description().await.ok_or_else(|| {
            PeerError::Negotiation {
                reason: "local description missing after gathering".into(),
            }
        })?;
        debug!("Local {} ready ({} bytes of SDP)", local.sdp_type, local.sdp.len());
        from_rtc(local)
    }

    /// Apply the remote peer's description, completing the exchange.
    pub async fn apply_remote(&self, description: SessionDescription) -> Result<(), PeerError> {
        debug!("Applying remote {}", description.kind);
        let rtc = to_rtc(&description)?;
        self.pc
            .set_remote_description(rtc)
            .await
            .map_err(|e| PeerError::Negotiation { reason: e.to_string() })
    }

    pub async fn close(&self) -> Result<(), PeerError> {
        self.pc
            .close()
            .await
            .map_err(|e| PeerError::Negotiation { reason: e.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use aircast_core::{SdpKind, SessionDescription};
    use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
    use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

    use super::{from_rtc, to_rtc};

    // A minimal but structurally valid SDP; RTCSessionDescription parses on
    // construction, so an empty string would be rejected.
    const SDP: &str = "v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\n";

    #[test]
    fn offer_and_answer_convert_both_ways() {
        for kind in [SdpKind::Offer, SdpKind::Answer, SdpKind::Pranswer] {
            let ours = SessionDescription::new(kind, SDP);
            let rtc = to_rtc(&ours).expect("convert out");
            let back = from_rtc(rtc).expect("convert back");
            assert_eq!(back, ours);
        }
    }

    #[test]
    fn rollback_is_rejected_on_the_way_out() {
        let rollback = SessionDescription::new(SdpKind::Rollback, SDP);
        assert!(to_rtc(&rollback).is_err());
    }

    #[test]
    fn unspecified_description_is_rejected() {
        let mut rtc = RTCSessionDescription::default();
        assert_eq!(rtc.sdp_type, RTCSdpType::Unspecified);
        rtc.sdp = SDP.to_string();
        assert!(from_rtc(rtc).is_err());
    }
}
