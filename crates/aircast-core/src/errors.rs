use thiserror::Error;

#[derive(Error, Debug)]
pub enum AirCastError {
    #[error("Configuration invalid: {reason}")]
    ConfigurationInvalid { reason: String },

    #[error("Signaling error: {0}")]
    Signaling(#[from] SignalingError),

    #[error("Peer connection error: {0}")]
    Peer(#[from] PeerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the HTTP offer/answer exchange, on either role.
///
/// Every variant is recoverable from the server's point of view: a bad
/// request gets a structured HTTP response and the listener keeps serving.
#[derive(Error, Debug)]
pub enum SignalingError {
    #[error("Failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("Peer answered with HTTP {status}")]
    Status { status: u16 },

    #[error("Description encode/decode failed: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Signaling server is shut down")]
    ServerClosed,

    #[error("Negotiation was dropped before an answer was supplied")]
    AnswerDropped,
}

/// Failures surfaced by the peer-connection layer.
///
/// The underlying library errors are carried as strings so that core stays
/// free of the `webrtc` dependency.
#[derive(Error, Debug)]
pub enum PeerError {
    #[error("Media engine setup failed: {reason}")]
    Engine { reason: String },

    #[error("Negotiation failed: {reason}")]
    Negotiation { reason: String },

    #[error("Description rejected: {reason}")]
    InvalidDescription { reason: String },

    #[error("Track setup failed: {reason}")]
    Track { reason: String },
}
