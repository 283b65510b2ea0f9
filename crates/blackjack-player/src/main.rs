//! LAN Blackjack player entry point.
//!
//! Wires the offer listener to the session engine and puts a console on
//! top:
//!
//! ```text
//! main()
//!  └─ load_config()          -- TOML, defaults on first run
//!  └─ start_offer_listener   -- UDP background thread
//!  └─ for each matching offer:
//!       ├─ prompt round count on stdin
//!       ├─ connect_to_dealer
//!       ├─ play_session      -- stdin Hit/Stand decider
//!       └─ print session stats, back to listening
//! ```
//!
//! All card and outcome display names live here; the application layer
//! only ever sees ranks, suits, and [`GameEvent`]s.

use std::io::Write as _;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use blackjack_core::{Card, Hand, PlayerAction, RoundOutcome, SessionStats};
use blackjack_player::application::play_session::{play_session, GameEvent};
use blackjack_player::infrastructure::network::{connect_to_dealer, discovery};
use blackjack_player::infrastructure::storage::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cfg.player.log_level.clone())),
        )
        .init();

    info!(identity = %cfg.player.identity, "LAN Blackjack player starting");

    let running = Arc::new(AtomicBool::new(true));

    let mut offers = discovery::start_offer_listener(
        cfg.network.discovery_port,
        cfg.player.identity.clone(),
        Arc::clone(&running),
    )?;

    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    println!("Looking for a dealer on UDP {}...", cfg.network.discovery_port);

    while let Some(offer) = offers.recv().await {
        if !running.load(Ordering::Relaxed) {
            break;
        }

        let dealer_addr = SocketAddr::new(offer.dealer_addr.ip(), offer.service_port);
        println!(
            "Found dealer {:?} at {dealer_addr}.",
            offer.identity
        );

        let rounds = tokio::task::spawn_blocking(prompt_round_count).await?;
        let identity = cfg.player.identity.clone();

        match run_one_session(dealer_addr, rounds, identity).await {
            Ok(stats) => print_session_summary(&stats),
            Err(e) => {
                warn!("session against {dealer_addr} failed: {e}");
                println!("Session ended early: {e}");
            }
        }

        println!("Back to listening for dealers...");
    }

    info!("LAN Blackjack player stopped");
    Ok(())
}

/// Connects and plays one session; console output flows through the
/// event printer task.
async fn run_one_session(
    dealer_addr: SocketAddr,
    rounds: u8,
    identity: String,
) -> anyhow::Result<SessionStats> {
    let mut stream = connect_to_dealer(dealer_addr).await?;

    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(event);
        }
    });

    let stats = play_session(&mut stream, rounds, &identity, prompt_decision, tx).await?;

    // The sender is gone once play_session returns, so the printer drains
    // and exits on its own.
    if let Err(e) = printer.await {
        error!("event printer task failed: {e}");
    }
    Ok(stats)
}

// ── Console I/O ───────────────────────────────────────────────────────────────

/// Asks for the number of rounds until a value in 1..=255 is given.
fn prompt_round_count() -> u8 {
    loop {
        print!("How many rounds would you like to play? ");
        std::io::stdout().flush().ok();
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_err() {
            return 1;
        }
        match line.trim().parse::<u8>() {
            Ok(n) if n > 0 => return n,
            _ => println!("Please enter a number between 1 and 255."),
        }
    }
}

/// Asks Hit or Stand. Anything starting with `h` (either case) hits.
fn prompt_decision(hand: &Hand) -> PlayerAction {
    print!("You hold {}. [h]it or [s]tand? ", hand.total());
    std::io::stdout().flush().ok();
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return PlayerAction::Stand;
    }
    if line.trim().to_ascii_lowercase().starts_with('h') {
        PlayerAction::Hit
    } else {
        PlayerAction::Stand
    }
}

fn print_event(event: GameEvent) {
    match event {
        GameEvent::RoundStarted { round } => println!("\n── Round {round} ──"),
        GameEvent::PlayerCard { card, total } => {
            println!("You are dealt {} (total {total}).", card_name(card));
        }
        GameEvent::DealerUpCard { card } => {
            println!("Dealer shows {}.", card_name(card));
        }
        GameEvent::HitCard { card, total } => {
            println!("You draw {} (total {total}).", card_name(card));
        }
        GameEvent::TurnPrompt { .. } => { /* prompt_decision handles the asking */ }
        GameEvent::RoundResult { outcome } => {
            let text = match outcome {
                RoundOutcome::Win => "You win!",
                RoundOutcome::Loss => "You lose.",
                RoundOutcome::Tie => "It's a tie.",
            };
            println!("{text}");
        }
    }
}

fn print_session_summary(stats: &SessionStats) {
    println!(
        "\nSession over: {} wins, {} losses, {} ties over {} rounds.",
        stats.wins,
        stats.losses,
        stats.ties,
        stats.rounds_played()
    );
    println!("Win rate: {:.0}%", stats.win_rate() * 100.0);
}

fn card_name(card: Card) -> String {
    format!("{} of {}", rank_name(card.rank), suit_name(card.suit))
}

fn rank_name(rank: u8) -> String {
    match rank {
        1 => "Ace".to_string(),
        11 => "Jack".to_string(),
        12 => "Queen".to_string(),
        13 => "King".to_string(),
        n => n.to_string(),
    }
}

fn suit_name(suit: u8) -> &'static str {
    match suit {
        0 => "Hearts",
        1 => "Diamonds",
        2 => "Clubs",
        _ => "Spades",
    }
}
