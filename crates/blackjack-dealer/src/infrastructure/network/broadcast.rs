//! UDP broadcast of dealer offers.
//!
//! Once per second the dealer sends one Offer datagram to the LAN
//! broadcast address on the discovery port. The datagram carries the TCP
//! service port players should connect to and the dealer's identity
//! string; players filter on the identity before connecting.
//!
//! The broadcaster runs as a blocking loop on a dedicated thread so the
//! 1-second cadence never touches the Tokio runtime. The thread exits
//! cleanly when the shared `running` flag clears.
//!
//! # How UDP broadcast discovery works (for beginners)
//!
//! UDP (User Datagram Protocol) is connectionless: a datagram is sent and
//! either arrives or it doesn't, with no retransmission or ordering. That
//! is exactly right for discovery: a lost offer costs nothing, because
//! another one follows a second later.
//!
//! 1. The dealer sends each Offer to `255.255.255.255`, the limited
//!    broadcast address. Every host on the local network segment receives
//!    it. Sending to a broadcast address requires the `SO_BROADCAST`
//!    socket option, set below via `set_broadcast(true)`.
//!
//! 2. A player listening on the discovery port reads the datagram, checks
//!    the identity, and now knows the dealer's IP (the datagram's source
//!    address) and TCP port (carried in the payload).
//!
//! 3. The player opens a TCP connection to that address and the game
//!    proper begins. Discovery state is never kept on the dealer side;
//!    every offer is self-contained.

use std::net::{SocketAddr, UdpSocket};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use blackjack_core::protocol::messages::OfferMessage;
use blackjack_core::{encode_message, Message};
use thiserror::Error;
use tracing::{info, warn};

/// Seconds between consecutive offers.
const OFFER_INTERVAL: Duration = Duration::from_secs(1);

/// Error type for broadcaster setup.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// The UDP socket could not be bound or configured.
    #[error("failed to set up broadcast socket: {0}")]
    Socket(#[from] std::io::Error),
}

/// Spawns the background thread that broadcasts offers until `running`
/// clears.
///
/// `service_port` must be the *resolved* TCP port the acceptor actually
/// listens on, not the configured one; the config may say port 0.
///
/// # Errors
///
/// Returns [`BroadcastError::Socket`] if the socket cannot be bound or
/// `SO_BROADCAST` cannot be enabled. Send failures after setup are logged
/// and retried on the next tick instead.
pub fn start_offer_broadcaster(
    identity: String,
    service_port: u16,
    discovery_port: u16,
    running: Arc<AtomicBool>,
) -> Result<(), BroadcastError> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.set_broadcast(true)?;

    let dest: SocketAddr = SocketAddr::from(([255, 255, 255, 255], discovery_port));
    let datagram = build_offer_datagram(&identity, service_port);

    std::thread::Builder::new()
        .name("dealer-offer".to_string())
        .spawn(move || {
            broadcast_loop(socket, dest, datagram, running);
        })
        .expect("failed to spawn broadcast thread");

    info!(identity, service_port, "offer broadcaster started, announcing to UDP {dest}");
    Ok(())
}

/// Encodes the offer once; the broadcast loop only resends the bytes.
fn build_offer_datagram(identity: &str, service_port: u16) -> Vec<u8> {
    encode_message(&Message::Offer(OfferMessage {
        service_port,
        identity: identity.to_string(),
    }))
}

/// The send loop executed on the broadcaster thread.
fn broadcast_loop(
    socket: UdpSocket,
    dest: SocketAddr,
    datagram: Vec<u8>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::Relaxed) {
        if let Err(e) = socket.send_to(&datagram, dest) {
            warn!("failed to send offer to {dest}: {e}");
        }
        std::thread::sleep(OFFER_INTERVAL);
    }
    info!("offer broadcaster stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
