//! AirCast receiver — passive server shape.
//!
//! Starts the signaling listener, then answers every offer that arrives:
//!
//! ```text
//! SignalingServer ──► PendingOffer ──► PeerSession (fresh per negotiation)
//!                        │                apply_remote(offer)
//!                        │                create_answer()
//!                        └── answer ◄─────┘
//! ```
//!
//! Each negotiation gets its own peer connection, which stays alive until the
//! process is stopped with Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use aircast_core::IceConfig;
use aircast_peer::PeerSession;
use aircast_signaling::{PendingOffer, SignalingServer};

#[derive(Parser, Debug)]
#[command(name = "aircast-receiver", about = "Answer incoming AirCast offers")]
struct Args {
    /// Port for the HTTP signaling server.
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let args = Args::parse();
    info!("AirCast Receiver v{}", env!("CARGO_PKG_VERSION"));

    let (server, mut offers) = SignalingServer::bind(&format!("0.0.0.0:{}", args.port))
        .await
        .context("starting signaling server")?;
    info!("Waiting for offers on {}", server.local_addr());

    // Answered sessions are kept alive until shutdown.
    let mut sessions = Vec::new();

    loop {
        tokio::select! {
            maybe_offer = offers.recv() => {
                match maybe_offer {
                    Some(pending) => match negotiate(pending).await {
                        Ok(session) => sessions.push(session),
                        Err(e) => warn!("Negotiation failed: {e:#}"),
                    },
                    None => break, // listener gone
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C — shutting down");
                break;
            }
        }
    }

    for session in &sessions {
        if let Err(e) = session.close().await {
            warn!("Closing session failed: {e}");
        }
    }
    server.shutdown().await;
    info!("Receiver exited cleanly.");
    Ok(())
}

/// Answer one offer with a fresh peer connection.
async fn negotiate(pending: PendingOffer) -> Result<PeerSession> {
    info!("Offer received (session={})", pending.session);

    let session = PeerSession::connect(&IceConfig::default()).await?;
    session.log_incoming_tracks();
    session.apply_remote(pending.description.clone()).await?;
    let answer = session.create_answer().await?;

    if pending.answer(answer).is_err() {
        warn!("Peer went away before the answer could be delivered");
    }
    Ok(session)
}
