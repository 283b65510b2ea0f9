//! LAN Blackjack dealer entry point.
//!
//! Wires the infrastructure services together and runs until Ctrl-C:
//!
//! ```text
//! main()
//!  └─ load_config()          -- TOML, defaults on first run
//!  └─ bind_listener()        -- TCP, resolves service port (0 = any)
//!  └─ start_offer_broadcaster -- UDP background thread, 1 s cadence
//!  └─ accept_loop            -- Tokio task per connection
//! ```

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tracing::info;
use tracing_subscriber::EnvFilter;

use blackjack_dealer::application::run_session::Pacing;
use blackjack_dealer::infrastructure::network::{acceptor, broadcast};
use blackjack_dealer::infrastructure::storage::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config()?;

    // Structured logging. `RUST_LOG` overrides the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cfg.dealer.log_level.clone())),
        )
        .init();

    info!(identity = %cfg.dealer.identity, "LAN Blackjack dealer starting");

    // Shutdown flag shared across all background services.
    let running = Arc::new(AtomicBool::new(true));

    // Bind first so the broadcaster announces the resolved port, not the
    // configured one (which may be 0).
    let (listener, addr) =
        acceptor::bind_listener(&cfg.network.bind_address, cfg.network.service_port).await?;

    broadcast::start_offer_broadcaster(
        cfg.dealer.identity.clone(),
        addr.port(),
        cfg.network.discovery_port,
        Arc::clone(&running),
    )?;

    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    info!("dealer ready on {addr}. Press Ctrl-C to exit.");
    acceptor::accept_loop(listener, Pacing::standard(), running).await;

    info!("LAN Blackjack dealer stopped");
    Ok(())
}
