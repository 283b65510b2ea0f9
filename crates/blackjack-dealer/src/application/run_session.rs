//! The dealer-side session engine: one complete blackjack session over one
//! connection.
//!
//! # Session lifecycle
//!
//! ```text
//! AwaitingRequest ──> RoundLoop ──────────────────────> Finished
//!                      │  DealingInitial
//!                      │  PlayerDecision (loop)
//!                      │  DealerPlay
//!                      │  RoundResolved
//!                      └─ (repeat for the requested round count)
//! ```
//!
//! Any I/O failure at any point aborts the whole session: the error is
//! returned to the acceptor for logging, the connection is dropped, and the
//! peer learns nothing beyond the closed stream. Partial-round results are
//! never reported.
//!
//! Within one session all frames are strictly ordered and synchronous: the
//! engine never sends a second turn prompt before the previous decision
//! arrived, and never pipelines result frames. Sessions on other
//! connections are fully independent: each engine owns its hands and its
//! deck exclusively, so no locking exists anywhere in this module.

use std::time::Duration;

use blackjack_core::protocol::messages::{
    GamePayloadMessage, Message, DECISION_LEN, SESSION_REQUEST_LEN,
};
use blackjack_core::{
    decode_message, encode_message, CardSource, Hand, PlayerAction, RoundOutcome, SessionStats,
    DEALER_STAND_TOTAL,
};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, info, trace};

/// How long a single `read` may sit idle before the engine re-checks the
/// stream. A human player can take arbitrarily long to answer a turn
/// prompt, so an expired timeout is retried rather than treated as fatal;
/// only a genuine peer close aborts.
const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that abort a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The peer closed the connection while a frame was expected.
    #[error("peer closed the connection")]
    PeerClosed,

    /// An I/O error occurred on the stream.
    #[error("session I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The opening frame was not a valid session request. The engine
    /// aborts without responding; a non-conforming peer is not worth a
    /// protocol conversation.
    #[error("handshake frame was not a valid session request")]
    BadHandshake,
}

/// Inter-frame pacing delays.
///
/// These exist purely so a human watching the player console sees cards
/// arrive one by one; they carry no protocol meaning. Tests run with
/// [`Pacing::none`].
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Delay after sending a card frame.
    pub card_delay: Duration,
    /// Delay after sending a round's result frame.
    pub round_delay: Duration,
}

impl Pacing {
    /// The delays used against real players.
    pub fn standard() -> Self {
        Self {
            card_delay: Duration::from_millis(100),
            round_delay: Duration::from_millis(500),
        }
    }

    /// No delays; used by tests.
    pub fn none() -> Self {
        Self {
            card_delay: Duration::ZERO,
            round_delay: Duration::ZERO,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::standard()
    }
}

/// What a completed session reports back to the acceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Identity token the player sent in its session request.
    pub peer_identity: String,
    /// Per-round outcomes, tallied from the player's perspective.
    pub stats: SessionStats,
}

/// Runs one full session on `stream`, drawing every card from `deck`.
///
/// Reads the session request, plays the requested number of rounds to
/// completion, and returns a [`SessionSummary`]. The caller owns the
/// stream and closes it by dropping it.
///
/// # Errors
///
/// Returns [`SessionError`] on peer close, I/O failure, or a bad
/// handshake; in every case the session is over and nothing was sent to
/// explain why.
pub async fn run_session<S, D>(
    stream: &mut S,
    deck: &mut D,
    pacing: Pacing,
) -> Result<SessionSummary, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    D: CardSource,
{
    let request = read_frame(stream, SESSION_REQUEST_LEN).await?;
    let (rounds, peer_identity) = match decode_message(&request) {
        Ok(Message::SessionRequest(m)) => (m.rounds, m.identity),
        _ => return Err(SessionError::BadHandshake),
    };
    info!(rounds, identity = %peer_identity, "session request accepted");

    let mut stats = SessionStats::default();
    for round in 1..=u32::from(rounds) {
        debug!(round, "round starting");
        let outcome = play_round(stream, deck, pacing).await?;
        debug!(round, ?outcome, "round resolved");
        stats.record(outcome);
        tokio::time::sleep(pacing.round_delay).await;
    }

    Ok(SessionSummary {
        peer_identity,
        stats,
    })
}

/// Plays a single round to its result frame.
async fn play_round<S, D>(
    stream: &mut S,
    deck: &mut D,
    pacing: Pacing,
) -> Result<RoundOutcome, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    D: CardSource,
{
    let mut player = Hand::new();
    let mut dealer = Hand::new();
    for _ in 0..2 {
        player.push(deck.draw());
    }
    for _ in 0..2 {
        dealer.push(deck.draw());
    }

    // DealingInitial: both player cards, then only the dealer's up-card.
    // The hole card never touches the wire.
    for i in 0..player.len() {
        send_payload(stream, GamePayloadMessage::card(player.cards()[i])).await?;
        tokio::time::sleep(pacing.card_delay).await;
    }
    send_payload(stream, GamePayloadMessage::card(dealer.cards()[0])).await?;

    // PlayerDecision: prompt, await exactly one decision, repeat on Hit.
    while !player.is_bust() {
        send_payload(stream, GamePayloadMessage::turn_prompt()).await?;
        match await_decision(stream).await? {
            PlayerAction::Hit => {
                let card = deck.draw();
                player.push(card);
                send_payload(stream, GamePayloadMessage::card(card)).await?;
                tokio::time::sleep(pacing.card_delay).await;
            }
            PlayerAction::Stand => break,
        }
    }

    // DealerPlay: fixed-threshold draw, skipped entirely on a player bust.
    // Cards drawn here are never sent individually.
    if !player.is_bust() {
        while dealer.total() < DEALER_STAND_TOTAL {
            dealer.push(deck.draw());
        }
    }

    let outcome = RoundOutcome::judge(player.total(), dealer.total());
    send_payload(stream, GamePayloadMessage::round_result(outcome)).await?;
    Ok(outcome)
}

/// Blocks until one valid Decision frame arrives.
///
/// Frames that fail magic/type validation are discarded without resending
/// the turn prompt; the engine simply keeps waiting.
async fn await_decision<S>(stream: &mut S) -> Result<PlayerAction, SessionError>
where
    S: AsyncRead + Unpin,
{
    loop {
        let frame = read_frame(stream, DECISION_LEN).await?;
        match decode_message(&frame) {
            Ok(Message::Decision(d)) => return Ok(d.action()),
            Ok(other) => debug!(?other, "discarding unexpected frame while awaiting decision"),
            Err(e) => debug!("discarding invalid decision frame: {e}"),
        }
    }
}

async fn send_payload<S>(stream: &mut S, payload: GamePayloadMessage) -> Result<(), SessionError>
where
    S: AsyncWrite + Unpin,
{
    stream
        .write_all(&encode_message(&Message::GamePayload(payload)))
        .await?;
    Ok(())
}

/// Reads exactly `len` bytes, accumulating across however many reads the
/// stream needs. An idle timeout is retried indefinitely (the peer may be
/// a human mid-thought); a read of zero bytes means the peer closed.
async fn read_frame<S>(stream: &mut S, len: usize) -> Result<Vec<u8>, SessionError>
where
    S: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        match timeout(IDLE_TIMEOUT, stream.read(&mut buf[filled..])).await {
            Err(_) => {
                trace!(filled, len, "idle timeout while awaiting frame; still waiting");
                continue;
            }
            Ok(Ok(0)) => return Err(SessionError::PeerClosed),
            Ok(Ok(n)) => filled += n,
            Ok(Err(e)) => return Err(SessionError::Io(e)),
        }
    }
    Ok(buf)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
