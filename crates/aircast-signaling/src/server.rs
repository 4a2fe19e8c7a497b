//! Server role of the signaling exchange.
//!
//! # Lifecycle
//!
//! ```text
//! 1. let (server, mut offers) = SignalingServer::bind("0.0.0.0:50000").await?
//! 2. let pending = offers.recv().await          ← one PendingOffer per POST
//! 3. inspect pending.description, negotiate elsewhere
//! 4. pending.answer(answer)?                    ← unblocks that request alone
//! 5. server.shutdown().await                    ← stop the listener (tests rely on this)
//! ```
//!
//! Every POST runs its own negotiation: the handler registers a session id,
//! queues the decoded offer together with a single-use answer slot, and stays
//! blocked until exactly that slot is filled. Offers and answers from
//! concurrent requests cannot interleave.

use std::net::SocketAddr;

use aircast_core::{SessionDescription, SessionId, SignalingError};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::SESSION_HEADER;

/// How many decoded offers may sit unclaimed before new POSTs wait for the
/// consumer to catch up.
const OFFER_QUEUE_DEPTH: usize = 16;

// ── PendingOffer ─────────────────────────────────────────────────────────────

/// One decoded offer waiting for its answer.
///
/// Dropping a `PendingOffer` without calling [`answer`](PendingOffer::answer)
/// fails the originating HTTP request with `502` instead of leaving it
/// blocked forever.
#[derive(Debug)]
pub struct PendingOffer {
    pub session: SessionId,
    pub description: SessionDescription,
    answer_tx: oneshot::Sender<SessionDescription>,
}

impl PendingOffer {
    /// Supply the answer for this negotiation, unblocking its HTTP request.
    pub fn answer(self, description: SessionDescription) -> Result<(), SignalingError> {
        self.answer_tx
            .send(description)
            .map_err(|_| SignalingError::AnswerDropped)
    }
}

// ── SignalingServer ──────────────────────────────────────────────────────────

/// Handle to a running signaling listener.
///
/// Created by [`bind`](SignalingServer::bind) together with the offer queue.
/// The listener lives on a background task until [`shutdown`] is called or
/// the handle is dropped.
///
/// [`shutdown`]: SignalingServer::shutdown
pub struct SignalingServer {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SignalingServer {
    /// Bind the exchange endpoint on `addr` and start serving.
    ///
    /// A port that cannot be bound is reported as
    /// [`SignalingError::Bind`] — never a panic — so a supervisor can retry
    /// or pick another port.
    pub async fn bind(
        addr: &str,
    ) -> Result<(Self, mpsc::Receiver<PendingOffer>), SignalingError> {
        let (offer_tx, offer_rx) = mpsc::channel(OFFER_QUEUE_DEPTH);

        let app = Router::new()
            .route("/", any(exchange_handler))
            .with_state(offer_tx);

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
                warn!("Signaling listener stopped with error: {e}");
            }
        });

        info!("Signaling server listening on {local_addr}");
        Ok((
            Self { local_addr, shutdown_tx: Some(shutdown_tx), task },
            offer_rx,
        ))
    }

    /// Address the listener actually bound — useful with port `0`.
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

impl Drop for SignalingServer {
    fn drop(&mut self) {
        // Fire-and-forget: lets tests tear down without awaiting shutdown().
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

// ── Handler ──────────────────────────────────────────────────────────────────

/// CORS headers set on every response, preflight included.
fn cors() -> [(HeaderName, &'static str); 3] {
    [
        (HeaderName::from_static("access-control-allow-origin"), "*"),
        (HeaderName::from_static("access-control-allow-methods"), "POST"),
        (HeaderName::from_static("access-control-allow-headers"), "Content-Type"),
    ]
}

async fn exchange_handler(
    State(offer_tx): State<mpsc::Sender<PendingOffer>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method == Method::OPTIONS {
        return (StatusCode::OK, cors()).into_response();
    }
    if method != Method::POST {
        return (StatusCode::BAD_REQUEST, cors(), "Please send a POST request").into_response();
    }
    if body.is_empty() {
        return (StatusCode::BAD_REQUEST, cors(), "Please send a request body").into_response();
    }

    // Malformed input fails this request only; the listener keeps serving.
    let description: SessionDescription = match serde_json::from_slice(&body) {
        Ok(d) => d,
        Err(e) => {
            debug!("Rejecting undecodable description: {e}");
            return (
                StatusCode::BAD_REQUEST,
                cors(),
                format!("Invalid session description: {e}"),
            )
                .into_response();
        }
    };

    let session = session_id(&headers);
    debug!("Offer received (session={session}, {} bytes)", body.len());

    let (answer_tx, answer_rx) = oneshot::channel();
    let pending = PendingOffer {
        session: session.clone(),
        description,
        answer_tx,
    };
    if offer_tx.send(pending).await.is_err() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            cors(),
            "Signaling server is shutting down",
        )
            .into_response();
    }

    // Block this request until its own answer slot is filled.
    match answer_rx.await {
        Ok(answer) => (
            StatusCode::OK,
            cors(),
            [(HeaderName::from_static(SESSION_HEADER), session.0)],
            Json(answer),
        )
            .into_response(),
        Err(_) => {
            warn!("Negotiation dropped without an answer (session={session})");
            (
                StatusCode::BAD_GATEWAY,
                cors(),
                "Negotiation was dropped before an answer was supplied",
            )
                .into_response()
        }
    }
}

/// Session identity for one POST: the client's `X-Session-Id` when present
/// and readable, a fresh UUID otherwise.
fn session_id(headers: &HeaderMap) -> SessionId {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| SessionId(v.to_string()))
        .unwrap_or_else(|| SessionId(Uuid::new_v4().to_string()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use aircast_core::{SdpKind, SessionDescription, SignalingError};

    use super::SignalingServer;
    use crate::client::{exchange, SignalingClient};

    async fn bind_ephemeral() -> (SignalingServer, tokio::sync::mpsc::Receiver<super::PendingOffer>, String)
    {
        let (server, offers) = SignalingServer::bind("127.0.0.1:0").await.expect("bind");
        let addr = server.local_addr().to_string();
        (server, offers, addr)
    }

    #[tokio::test]
    async fn post_publishes_once_and_blocks_until_answered() {
        let (_server, mut offers, addr) = bind_ephemeral().await;

        let url = format!("http://{addr}/");
        let request = tokio::spawn(async move {
            reqwest::Client::new()
                .post(url)
                .json(&SessionDescription::offer("v=0..."))
                .send()
                .await
                .expect("send")
        });

        let pending = offers.recv().await.expect("offer published");
        assert_eq!(pending.description.kind, SdpKind::Offer);
        assert_eq!(pending.description.sdp, "v=0...");

        // Exactly once, and no response until the answer slot is filled.
        assert!(offers.try_recv().is_err());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!request.is_finished());

        pending.answer(SessionDescription::answer("v=0...")).expect("answer");
        let response = request.await.expect("join");
        assert_eq!(response.status(), 200);
        let answer: SessionDescription = response.json().await.expect("decode");
        assert_eq!(answer.kind, SdpKind::Answer);
    }

    #[tokio::test]
    async fn options_preflight_gets_cors_and_touches_nothing() {
        let (_server, mut offers, addr) = bind_ephemeral().await;

        let response = reqwest::Client::new()
            .request(reqwest::Method::OPTIONS, format!("http://{addr}/"))
            .send()
            .await
            .expect("send");

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(response.headers()["access-control-allow-methods"], "POST");
        assert_eq!(response.headers()["access-control-allow-headers"], "Content-Type");
        assert!(response.bytes().await.expect("body").is_empty());
        assert!(offers.try_recv().is_err());
    }

    #[tokio::test]
    async fn get_is_rejected_without_publishing() {
        let (_server, mut offers, addr) = bind_ephemeral().await;

        let response = reqwest::get(format!("http://{addr}/")).await.expect("send");
        assert_eq!(response.status(), 400);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert!(offers.try_recv().is_err());
    }

    #[tokio::test]
    async fn empty_body_is_rejected() {
        let (_server, _offers, addr) = bind_ephemeral().await;

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/"))
            .send()
            .await
            .expect("send");
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn malformed_json_rejects_request_but_not_listener() {
        let (_server, mut offers, addr) = bind_ephemeral().await;

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/"))
            .body("{not json")
            .send()
            .await
            .expect("send");
        assert_eq!(response.status(), 400);
        assert!(offers.try_recv().is_err());

        // The listener survives and the next negotiation succeeds.
        tokio::spawn(async move {
            let pending = offers.recv().await.expect("offer");
            pending.answer(SessionDescription::answer("v=0...")).expect("answer");
        });
        let answer = exchange(&SessionDescription::offer("v=0..."), &addr)
            .await
            .expect("exchange after bad request");
        assert_eq!(answer.kind, SdpKind::Answer);
    }

    #[tokio::test]
    async fn end_to_end_exchange() {
        let (_server, mut offers, addr) = bind_ephemeral().await;

        tokio::spawn(async move {
            let pending = offers.recv().await.expect("offer");
            assert_eq!(pending.description.sdp, "X");
            pending.answer(SessionDescription::answer("Y")).expect("answer");
        });

        let answer = exchange(&SessionDescription::offer("X"), &addr)
            .await
            .expect("exchange");
        assert_eq!(answer, SessionDescription::answer("Y"));
    }

    #[tokio::test]
    async fn concurrent_exchanges_never_cross_pair() {
        let (_server, mut offers, addr) = bind_ephemeral().await;

        // Answer every offer with a tag derived from it, out of arrival order
        // as far as the conduits are concerned.
        tokio::spawn(async move {
            while let Some(pending) = offers.recv().await {
                let tagged = format!("answer-for-{}", pending.description.sdp);
                pending.answer(SessionDescription::answer(tagged)).expect("answer");
            }
        });

        let mut calls = Vec::new();
        for i in 0..8 {
            let addr = addr.clone();
            calls.push(tokio::spawn(async move {
                let offer = SessionDescription::offer(format!("offer-{i}"));
                (i, exchange(&offer, &addr).await.expect("exchange"))
            }));
        }

        for call in calls {
            let (i, answer) = call.await.expect("join");
            assert_eq!(answer.sdp, format!("answer-for-offer-{i}"));
        }
    }

    #[tokio::test]
    async fn client_session_id_is_honored_and_echoed() {
        let (_server, mut offers, addr) = bind_ephemeral().await;

        let consumer = tokio::spawn(async move {
            let pending = offers.recv().await.expect("offer");
            let session = pending.session.clone();
            pending.answer(SessionDescription::answer("v=0...")).expect("answer");
            session
        });

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/"))
            .header(crate::SESSION_HEADER, "nego-42")
            .json(&SessionDescription::offer("v=0..."))
            .send()
            .await
            .expect("send");

        assert_eq!(response.headers()[crate::SESSION_HEADER], "nego-42");
        assert_eq!(consumer.await.expect("join").as_str(), "nego-42");
    }

    #[tokio::test]
    async fn dropped_negotiation_maps_to_bad_gateway() {
        let (_server, mut offers, addr) = bind_ephemeral().await;

        tokio::spawn(async move {
            // Claim the offer and drop it unanswered.
            let _ = offers.recv().await.expect("offer");
        });

        let err = SignalingClient::new(&addr)
            .exchange(&SessionDescription::offer("v=0..."))
            .await
            .expect_err("no answer supplied");
        assert!(matches!(err, SignalingError::Status { status: 502 }));
    }

    #[tokio::test]
    async fn bind_failure_is_reported_not_fatal() {
        let (server, _offers, addr) = bind_ephemeral().await;

        let err = SignalingServer::bind(&addr).await.err().expect("port taken");
        assert!(matches!(err, SignalingError::Bind { .. }));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_closes_the_offer_queue() {
        let (server, mut offers, addr) = bind_ephemeral().await;

        server.shutdown().await;
        assert!(offers.recv().await.is_none());

        let result = reqwest::Client::new()
            .post(format!("http://{addr}/"))
            .json(&SessionDescription::offer("v=0..."))
            .send()
            .await;
        assert!(result.is_err());
    }
}
