//! aircast-peer — thin wiring around the `webrtc` crate.
//!
//! The peer connection owns everything hard here (ICE, DTLS, RTP, SDP
//! generation); this crate only moves [`SessionDescription`] values across
//! the boundary and attaches capture tracks:
//!
//! ```text
//! MediaConstraints ──► MediaSource ──► local tracks
//!                                        │
//!                                        ▼
//! PeerSession::connect ───────────► RTCPeerConnection
//!   create_offer / create_answer ──► SessionDescription (signaling-ready)
//!   apply_remote ◄────────────────── SessionDescription (from signaling)
//! ```
//!
//! Descriptions leave this crate only after ICE gathering has completed, so
//! the one document the HTTP exchange ships each way is self-contained.
//!
//! [`SessionDescription`]: aircast_core::SessionDescription

pub mod media;
pub mod session;

pub use media::{MediaSource, StaticSource};
pub use session::PeerSession;
