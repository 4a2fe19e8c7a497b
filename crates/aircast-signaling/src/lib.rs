//! aircast-signaling — HTTP offer/answer exchange.
//!
//! The signaling channel moves exactly one [`SessionDescription`] in each
//! direction per negotiation, over plain HTTP. Two roles exist:
//!
//! ```text
//! Sender (client role)                    Receiver (server role)
//! ────────────────────                    ──────────────────────
//! create offer                            SignalingServer::bind
//!   │                                       │
//!   ▼                                       ▼
//! exchange() ── POST http://addr/ ──────► handler decodes offer
//!   │                                       │ PendingOffer ──► offers queue
//!   │                                       │                    │
//!   │                                       │ awaits answer ◄── pending.answer()
//!   ◄────────── 200 {"type":"answer"} ──────┘
//! apply answer
//! ```
//!
//! Each POST owns its negotiation: the offer is delivered as a
//! [`PendingOffer`] carrying a single-use answer slot, keyed by a session id
//! (`X-Session-Id` header, generated when absent). Concurrent exchanges can
//! never cross-pair.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use aircast_signaling::{exchange, SessionDescription, SignalingServer};
//!
//! # async fn demo() -> Result<(), aircast_signaling::SignalingError> {
//! // Server role: answer every incoming offer.
//! let (server, mut offers) = SignalingServer::bind("127.0.0.1:50000").await?;
//! tokio::spawn(async move {
//!     while let Some(pending) = offers.recv().await {
//!         let _ = pending.answer(SessionDescription::answer("v=0..."));
//!     }
//! });
//!
//! // Client role: trade our offer for the peer's answer.
//! let answer = exchange(&SessionDescription::offer("v=0..."), "127.0.0.1:50000").await?;
//! # let _ = (answer, server);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod inbox;
pub mod server;

pub use aircast_core::{SdpKind, SessionDescription, SessionId, SignalingError};
pub use client::{exchange, SignalingClient};
pub use inbox::SdpInbox;
pub use server::{PendingOffer, SignalingServer};

/// Header carrying the negotiation session id, both ways.
///
/// Clients may supply their own; the server generates a UUID when the header
/// is absent and echoes the effective id on the response.
pub const SESSION_HEADER: &str = "x-session-id";
