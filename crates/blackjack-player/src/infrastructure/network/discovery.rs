//! UDP offer listening: how a player finds its dealer.
//!
//! The player binds the discovery port and waits for dealers' Offer
//! broadcasts. On receiving a valid Offer whose identity matches the
//! configured expectation, it:
//!
//! 1. Takes the dealer's IP from the datagram's source address.
//! 2. Takes the TCP service port from the Offer payload.
//! 3. Emits an [`OfferEvent`] on the internal channel so the application
//!    layer can connect and start a session.
//!
//! Offers from other dealers (mismatched identity) are logged and
//! skipped. Malformed datagrams are ignored entirely; broadcast ports
//! collect noise and none of it may disturb the listener.
//!
//! The listener runs as a blocking loop on a dedicated thread to avoid
//! blocking the Tokio runtime with synchronous socket I/O.
//!
//! # Read timeout
//!
//! The socket is configured with a 500 ms read timeout so the loop can
//! check the `running` flag between datagrams; when the application is
//! shutting down the thread exits within half a second.

use std::net::{SocketAddr, UdpSocket};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use blackjack_core::{decode_message, Message};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Error type for discovery listener setup.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The UDP socket could not be bound.
    #[error("failed to bind discovery socket on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// A matching offer from a dealer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferEvent {
    /// Source address of the offer datagram; the IP is the dealer's.
    pub dealer_addr: SocketAddr,
    /// TCP port the dealer accepts sessions on.
    pub service_port: u16,
    /// The dealer's identity token, as broadcast.
    pub identity: String,
}

/// Binds the discovery port and spawns the background thread that
/// processes incoming Offer datagrams.
///
/// Only offers whose identity equals `expected_identity` surface on the
/// returned channel.
///
/// # Errors
///
/// Returns [`DiscoveryError::BindFailed`] if the socket cannot be bound.
pub fn start_offer_listener(
    discovery_port: u16,
    expected_identity: String,
    running: Arc<AtomicBool>,
) -> Result<mpsc::Receiver<OfferEvent>, DiscoveryError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], discovery_port));
    let socket =
        UdpSocket::bind(addr).map_err(|source| DiscoveryError::BindFailed { addr, source })?;
    socket
        .set_read_timeout(Some(Duration::from_millis(500)))
        .ok();

    let (tx, rx) = mpsc::channel(64);

    std::thread::Builder::new()
        .name("player-discovery".to_string())
        .spawn(move || {
            listen_loop(socket, expected_identity, tx, running);
        })
        .expect("failed to spawn discovery thread");

    info!("offer listener on UDP {addr}");
    Ok(rx)
}

/// The main receive loop executed on the discovery thread.
fn listen_loop(
    socket: UdpSocket,
    expected_identity: String,
    tx: mpsc::Sender<OfferEvent>,
    running: Arc<AtomicBool>,
) {
    let mut buf = vec![0u8; 4096];

    while running.load(Ordering::Relaxed) {
        let (len, src) = match socket.recv_from(&mut buf) {
            Ok(pair) => pair,
            Err(e) if is_timeout_error(&e) => continue,
            Err(e) => {
                error!("discovery recv error: {e}");
                continue;
            }
        };

        match decode_message(&buf[..len]) {
            Ok(Message::Offer(offer)) => {
                if offer.identity != expected_identity {
                    debug!(
                        "ignoring offer from {src}: identity {:?} (expecting {:?})",
                        offer.identity, expected_identity
                    );
                    continue;
                }
                debug!("offer from {src}: service port {}", offer.service_port);
                let event = OfferEvent {
                    dealer_addr: src,
                    service_port: offer.service_port,
                    identity: offer.identity,
                };
                if tx.blocking_send(event).is_err() {
                    // Receiver dropped, application is shutting down.
                    break;
                }
            }
            Ok(other) => {
                debug!("ignoring non-offer frame on discovery port from {src}: {other:?}");
            }
            Err(e) => {
                debug!("ignoring undecodable datagram from {src}: {e}");
            }
        }
    }

    info!("offer listener stopped");
}

/// Returns `true` for OS timeout / would-block errors that should be retried.
fn is_timeout_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use blackjack_core::encode_message;
    use blackjack_core::protocol::messages::{OfferMessage, OFFER_LEN};

    fn offer_bytes(identity: &str, service_port: u16) -> Vec<u8> {
        encode_message(&Message::Offer(OfferMessage {
            service_port,
            identity: identity.to_string(),
        }))
    }

    #[test]
    fn test_is_timeout_error_recognises_timed_out_and_would_block() {
        for kind in [std::io::ErrorKind::TimedOut, std::io::ErrorKind::WouldBlock] {
            assert!(is_timeout_error(&std::io::Error::new(kind, "t")));
        }
        assert!(!is_timeout_error(&std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused"
        )));
    }

    #[tokio::test]
    async fn test_listener_surfaces_only_matching_offers() {
        // Bind the listener socket directly so the test knows the port,
        // then feed it three datagrams: corrupt magic, wrong identity,
        // and finally a matching offer. Only the last may surface.
        let socket = UdpSocket::bind("127.0.0.1:0").expect("listener bind");
        socket
            .set_read_timeout(Some(Duration::from_millis(100)))
            .ok();
        let addr = socket.local_addr().unwrap();

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);
        let (tx, mut rx) = mpsc::channel(8);
        let handle = std::thread::spawn(move || {
            listen_loop(socket, "house".to_string(), tx, running_clone);
        });

        let sender = UdpSocket::bind("127.0.0.1:0").expect("sender bind");

        // Correct length, broken magic: ignored without disturbing the
        // listener.
        let mut corrupt = offer_bytes("house", 5000);
        corrupt[0] = 0x00;
        assert_eq!(corrupt.len(), OFFER_LEN);
        sender.send_to(&corrupt, addr).unwrap();

        // Valid offer, wrong identity: skipped.
        sender.send_to(&offer_bytes("casino", 6000), addr).unwrap();

        // Matching offer: surfaces.
        sender.send_to(&offer_bytes("house", 7000), addr).unwrap();

        let event = rx.recv().await.expect("matching offer must surface");
        assert_eq!(event.service_port, 7000);
        assert_eq!(event.identity, "house");
        assert_eq!(event.dealer_addr.ip(), sender.local_addr().unwrap().ip());

        // Nothing else was queued.
        assert!(rx.try_recv().is_err());

        running.store(false, Ordering::Relaxed);
        handle.join().unwrap();
    }

    #[test]
    fn test_start_offer_listener_binds_os_assigned_port() {
        // Port 0 binds successfully; the flag starts cleared so the
        // thread exits after the first timeout tick.
        let running = Arc::new(AtomicBool::new(false));
        let result = start_offer_listener(0, "house".to_string(), running);
        assert!(result.is_ok());
    }
}
