//! TCP accept loop: one independent session task per connection.
//!
//! The listener is bound separately (see [`bind_listener`]) so the caller
//! can learn the OS-assigned port before the offer broadcaster starts
//! announcing it. The accept loop itself never exits on a per-connection
//! failure; a refused accept is logged and the loop continues.
//!
//! Each accepted connection gets its own tokio task, its own fresh
//! [`RandomDeck`], and its own session engine. Sessions share nothing, so
//! a slow or hostile player can only ever stall their own task.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use blackjack_core::RandomDeck;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::application::run_session::{run_session, Pacing};

/// How long a single `accept` waits before re-checking the running flag.
const ACCEPT_POLL: Duration = Duration::from_millis(500);

/// Binds the service listener on `bind_address:service_port`.
///
/// Port 0 asks the OS for any free port; the resolved address is returned
/// so the offer broadcaster can announce the real port.
///
/// # Errors
///
/// Returns the underlying I/O error when the address cannot be bound or
/// parsed by the resolver.
pub async fn bind_listener(
    bind_address: &str,
    service_port: u16,
) -> std::io::Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind((bind_address, service_port)).await?;
    let addr = listener.local_addr()?;
    info!("session listener bound on TCP {addr}");
    Ok((listener, addr))
}

/// Accepts connections until `running` clears, spawning a session task
/// for each.
pub async fn accept_loop(listener: TcpListener, pacing: Pacing, running: Arc<AtomicBool>) {
    while running.load(Ordering::Relaxed) {
        let (stream, peer) = match timeout(ACCEPT_POLL, listener.accept()).await {
            Err(_) => continue,
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                warn!("accept failed: {e}");
                continue;
            }
        };

        info!("connection from {peer}");
        tokio::spawn(async move {
            let mut stream = stream;
            let mut deck = RandomDeck::new();
            match run_session(&mut stream, &mut deck, pacing).await {
                Ok(summary) => info!(
                    peer = %peer,
                    identity = %summary.peer_identity,
                    wins = summary.stats.wins,
                    losses = summary.stats.losses,
                    ties = summary.stats.ties,
                    "session finished"
                ),
                Err(e) => warn!(peer = %peer, "session aborted: {e}"),
            }
        });
    }

    info!("accept loop stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
