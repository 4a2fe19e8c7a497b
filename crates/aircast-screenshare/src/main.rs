//! AirCast screen share — offers one display as a VP8 track, scaled to 360p.
//!
//! Same single-shot client shape as `aircast-sender`, with display capture
//! constraints instead of camera + microphone.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use aircast_core::{IceConfig, MediaConstraints};
use aircast_peer::{MediaSource, PeerSession, StaticSource};
use aircast_signaling::exchange;

#[derive(Parser, Debug)]
#[command(name = "aircast-screenshare", about = "Share a screen with a receiving peer")]
struct Args {
    /// Address the receiving peer's signaling server is hosted on.
    #[arg(long, default_value = "127.0.0.1:50000")]
    address: String,
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
    info!("AirCast Screenshare v{}", env!("CARGO_PKG_VERSION"));

    let constraints = MediaConstraints::screen();
    constraints.validate()?;

    let session = PeerSession::connect(&IceConfig::default()).await?;
    let tracks = StaticSource.display_media(&constraints).await?;
    session.add_send_tracks(tracks).await?;

    let offer = session.create_offer().await?;
    debug!("Local offer:\n{}", offer.sdp);

    let answer = exchange(&offer, &args.address)
        .await
        .with_context(|| format!("signaling exchange with {}", args.address))?;
    debug!("Remote answer:\n{}", answer.sdp);

    session.apply_remote(answer).await?;
    info!("Negotiation complete — press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    session.close().await?;
    info!("Screenshare exited cleanly.");
    Ok(())
}
