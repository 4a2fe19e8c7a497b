//! One-way SDP inbox.
//!
//! The simpler of the two server shapes: `POST /sdp` hands a description to
//! the process and immediately gets `done` back — no pairing, no answer.
//! Useful when the reply travels over some other channel (or not at all,
//! as with a paste-the-answer-by-hand demo).

use std::net::SocketAddr;

use aircast_core::{SessionDescription, SignalingError};
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const INBOX_QUEUE_DEPTH: usize = 16;

/// Handle to a running inbox listener; descriptions arrive on the receiver
/// returned by [`bind`](SdpInbox::bind).
pub struct SdpInbox {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SdpInbox {
    /// Bind `POST /sdp` on `addr` and start serving.
    pub async fn bind(
        addr: &str,
    ) -> Result<(Self, mpsc::Receiver<SessionDescription>), SignalingError> {
        let (sdp_tx, sdp_rx) = mpsc::channel(INBOX_QUEUE_DEPTH);

        let app = Router::new()
            .route("/sdp", any(inbox_handler))
            .with_state(sdp_tx);

        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            SignalingError::Bind { addr: addr.to_string(), reason: e.to_string() }
        })?;
        let local_addr = listener.local_addr().map_err(|e| SignalingError::Bind {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = serve.await {
                warn!("SDP inbox stopped with error: {e}");
            }
        });

        info!("SDP inbox listening on {local_addr}");
        Ok((
            Self { local_addr, shutdown_tx: Some(shutdown_tx), task },
            sdp_rx,
        ))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for the listener task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.task).await;
    }
}

impl Drop for SdpInbox {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn inbox_handler(
    State(sdp_tx): State<mpsc::Sender<SessionDescription>>,
    method: Method,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return (StatusCode::BAD_REQUEST, "Please send a POST request").into_response();
    }
    if body.is_empty() {
        return (StatusCode::BAD_REQUEST, "Please send a request body").into_response();
    }

    let description: SessionDescription = match serde_json::from_slice(&body) {
        Ok(d) => d,
        Err(e) => {
            debug!("Rejecting undecodable description: {e}");
            return (
                StatusCode::BAD_REQUEST,
                format!("Invalid session description: {e}"),
            )
                .into_response();
        }
    };

    debug!("Inbox received a {} ({} bytes)", description.kind, body.len());
    if sdp_tx.send(description).await.is_err() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "SDP inbox is shutting down",
        )
            .into_response();
    }

    (StatusCode::OK, "done").into_response()
}

#[cfg(test)]
mod tests {
    use aircast_core::{SdpKind, SessionDescription};

    use super::SdpInbox;

    #[tokio::test]
    async fn post_yields_description_and_replies_done() {
        let (inbox, mut descriptions) = SdpInbox::bind("127.0.0.1:0").await.expect("bind");
        let url = format!("http://{}/sdp", inbox.local_addr());

        let response = reqwest::Client::new()
            .post(url)
            .json(&SessionDescription::offer("v=0..."))
            .send()
            .await
            .expect("send");

        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.expect("body"), "done");

        let received = descriptions.recv().await.expect("description");
        assert_eq!(received.kind, SdpKind::Offer);
        assert_eq!(received.sdp, "v=0...");
    }

    #[tokio::test]
    async fn non_post_is_rejected() {
        let (inbox, mut descriptions) = SdpInbox::bind("127.0.0.1:0").await.expect("bind");
        let url = format!("http://{}/sdp", inbox.local_addr());

        let response = reqwest::get(url).await.expect("send");
        assert_eq!(response.status(), 400);
        assert!(descriptions.try_recv().is_err());
    }
}
