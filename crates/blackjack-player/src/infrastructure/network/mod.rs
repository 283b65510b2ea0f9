//! Network infrastructure for the player: dealer discovery and the game
//! connection.

pub mod discovery;

use std::net::SocketAddr;

use tokio::net::TcpStream;
use tracing::info;

/// Opens the TCP game connection to a discovered dealer.
///
/// # Errors
///
/// Returns the underlying I/O error when the dealer cannot be reached.
pub async fn connect_to_dealer(addr: SocketAddr) -> std::io::Result<TcpStream> {
    let stream = TcpStream::connect(addr).await?;
    info!("connected to dealer at {addr}");
    Ok(stream)
}
