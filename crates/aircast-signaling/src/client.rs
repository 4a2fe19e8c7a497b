//! Client role of the signaling exchange.
//!
//! One call, one negotiation: serialize the local description, POST it to the
//! remote peer's signaling address, block on the response, decode the remote
//! description out of the body. The connection is closed once the body has
//! been consumed; there is no retry and no second round.

use aircast_core::{SessionDescription, SessionId, SignalingError};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use crate::SESSION_HEADER;

/// Content type the exchange sends, matching what browser clients send.
const JSON_UTF8: &str = "application/json; charset=utf-8";

// ── Convenience entry point ──────────────────────────────────────────────────

/// Exchange `description` for the remote peer's description via a single
/// HTTP POST to `http://<address>`.
pub async fn exchange(
    description: &SessionDescription,
    address: &str,
) -> Result<SessionDescription, SignalingError> {
    SignalingClient::new(address).exchange(description).await
}

// ── SignalingClient ──────────────────────────────────────────────────────────

/// Client half of the HTTP signaling channel.
///
/// Holds a reusable HTTP client for the remote address. Use
/// [`exchange`](SignalingClient::exchange) for a one-shot negotiation, or
/// [`exchange_keyed`](SignalingClient::exchange_keyed) to pin the session id
/// the server will file the negotiation under.
pub struct SignalingClient {
    http: reqwest::Client,
    url: String,
}

impl SignalingClient {
    pub fn new(address: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: format!("http://{address}/"),
        }
    }

    /// Trade `description` for the remote description.
    pub async fn exchange(
        &self,
        description: &SessionDescription,
    ) -> Result<SessionDescription, SignalingError> {
        self.send(description, None).await
    }

    /// Same as [`exchange`](SignalingClient::exchange), with an explicit
    /// negotiation session id carried in the request header.
    pub async fn exchange_keyed(
        &self,
        description: &SessionDescription,
        session: &SessionId,
    ) -> Result<SessionDescription, SignalingError> {
        self.send(description, Some(session)).await
    }

    async fn send(
        &self,
        description: &SessionDescription,
        session: Option<&SessionId>,
    ) -> Result<SessionDescription, SignalingError> {
        let payload = serde_json::to_vec(description)?;
        debug!("POST {} ({} bytes, {})", self.url, payload.len(), description.kind);

        let mut request = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, JSON_UTF8)
            .body(payload);
        if let Some(session) = session {
            request = request.header(SESSION_HEADER, session.as_str());
        }

        let response = request.send().await.map_err(|e| SignalingError::Request {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SignalingError::Status { status: status.as_u16() });
        }

        let body = response.bytes().await.map_err(|e| SignalingError::Request {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        let remote: SessionDescription = serde_json::from_slice(&body)?;
        info!("Exchange complete: {} for {}", description.kind, remote.kind);
        Ok(remote)
    }
}
