//! The player-side session engine: one complete blackjack session over one
//! connected stream.
//!
//! The engine is a frame consumer. After sending the session request it
//! only ever reacts to the dealer's 9-byte payload frames:
//!
//! - card frames build up the visible table state (the first two cards
//!   are the player's, the third is the dealer's up-card, anything later
//!   is a hit card),
//! - the turn-prompt control frame asks the injected decision closure and
//!   answers with a Decision frame,
//! - a result frame closes the round.
//!
//! Frames that fail magic/type validation are skipped silently; the
//! dealer's next valid frame resynchronises the round, because every
//! frame is self-describing and fixed-size.
//!
//! Presentation is decoupled through [`GameEvent`]s on an mpsc channel;
//! this module performs no console I/O.

use std::time::Duration;

use blackjack_core::protocol::messages::{
    DecisionMessage, SessionRequestMessage, GAME_PAYLOAD_LEN,
};
use blackjack_core::{
    decode_message, encode_message, Card, Hand, Message, PlayerAction, RoundOutcome, SessionStats,
};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::debug;

/// How long the player waits for the dealer before giving up on a fully
/// idle stream. A dealer mid-frame gets more patience: once the first
/// byte of a frame has arrived the rest is assumed to be in flight.
const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that abort a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The dealer closed the connection while a frame was expected.
    #[error("dealer closed the connection")]
    PeerClosed,

    /// The dealer sent nothing at all for the idle-timeout window.
    #[error("dealer idle for too long, abandoning session")]
    IdleTimeout,

    /// An I/O error occurred on the stream.
    #[error("session I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the console layer may want to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A new round is about to be dealt. Rounds count from 1.
    RoundStarted { round: u32 },
    /// One of the player's first two cards.
    PlayerCard { card: Card, total: u32 },
    /// The dealer's single visible card.
    DealerUpCard { card: Card },
    /// A card drawn on Hit.
    HitCard { card: Card, total: u32 },
    /// The dealer is waiting for a Hit/Stand decision.
    TurnPrompt { total: u32 },
    /// The round's outcome, from the player's perspective.
    RoundResult { outcome: RoundOutcome },
}

/// Plays a full session on `stream`: `rounds` rounds, announcing
/// `identity` in the session request.
///
/// `decide` is called once per turn prompt with the player's current
/// hand. [`GameEvent`]s are emitted on `events` as the session unfolds; a
/// dropped receiver is tolerated and simply mutes the stream of events.
///
/// Returns the tallied [`SessionStats`] when all rounds are resolved.
///
/// # Errors
///
/// Returns [`SessionError`] when the dealer closes the connection, goes
/// silent past the idle window, or the stream fails.
pub async fn play_session<S, D>(
    stream: &mut S,
    rounds: u8,
    identity: &str,
    mut decide: D,
    events: mpsc::Sender<GameEvent>,
) -> Result<SessionStats, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    D: FnMut(&Hand) -> PlayerAction,
{
    let request = Message::SessionRequest(SessionRequestMessage {
        rounds,
        identity: identity.to_string(),
    });
    stream.write_all(&encode_message(&request)).await?;

    let mut stats = SessionStats::default();
    for round in 1..=u32::from(rounds) {
        let _ = events.send(GameEvent::RoundStarted { round }).await;
        let outcome = play_round(stream, &mut decide, &events).await?;
        stats.record(outcome);
    }
    Ok(stats)
}

/// Consumes frames until this round's result arrives.
async fn play_round<S, D>(
    stream: &mut S,
    decide: &mut D,
    events: &mpsc::Sender<GameEvent>,
) -> Result<RoundOutcome, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    D: FnMut(&Hand) -> PlayerAction,
{
    let mut hand = Hand::new();
    let mut cards_seen = 0u32;

    loop {
        let frame = read_frame(stream, GAME_PAYLOAD_LEN).await?;
        let payload = match decode_message(&frame) {
            Ok(Message::GamePayload(p)) => p,
            Ok(other) => {
                debug!(?other, "skipping unexpected frame mid-round");
                continue;
            }
            Err(e) => {
                debug!("skipping invalid frame: {e}");
                continue;
            }
        };

        if let Some(outcome) = payload.result {
            let _ = events.send(GameEvent::RoundResult { outcome }).await;
            return Ok(outcome);
        }

        if payload.is_turn_prompt() {
            let _ = events
                .send(GameEvent::TurnPrompt { total: hand.total() })
                .await;
            let action = decide(&hand);
            let answer = Message::Decision(DecisionMessage::new(action));
            stream.write_all(&encode_message(&answer)).await?;
            continue;
        }

        let Some(card) = payload.dealt_card() else {
            debug!(rank = payload.rank, suit = payload.suit, "skipping frame with invalid card");
            continue;
        };
        cards_seen += 1;
        match cards_seen {
            1 | 2 => {
                hand.push(card);
                let _ = events
                    .send(GameEvent::PlayerCard { card, total: hand.total() })
                    .await;
            }
            3 => {
                let _ = events.send(GameEvent::DealerUpCard { card }).await;
            }
            _ => {
                hand.push(card);
                let _ = events
                    .send(GameEvent::HitCard { card, total: hand.total() })
                    .await;
            }
        }
    }
}

/// Reads exactly `len` bytes, accumulating across reads. A timeout with
/// nothing received aborts the session; a timeout mid-frame keeps
/// waiting. A read of zero bytes means the dealer closed.
async fn read_frame<S>(stream: &mut S, len: usize) -> Result<Vec<u8>, SessionError>
where
    S: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        match timeout(IDLE_TIMEOUT, stream.read(&mut buf[filled..])).await {
            Err(_) if filled == 0 => return Err(SessionError::IdleTimeout),
            Err(_) => {
                debug!(filled, len, "frame stalled mid-delivery, still waiting");
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

#[cfg(test)]
mod tests {
    use super::*;
    use blackjack_core::protocol::messages::{
        GamePayloadMessage, DECISION_LEN, SESSION_REQUEST_LEN,
    };
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};

    async fn read_session_request(dealer: &mut DuplexStream) -> SessionRequestMessage {
        let mut buf = [0u8; SESSION_REQUEST_LEN];
        dealer.read_exact(&mut buf).await.unwrap();
        match decode_message(&buf).unwrap() {
            Message::SessionRequest(m) => m,
            other => panic!("expected session request, got {other:?}"),
        }
    }

    async fn read_decision(dealer: &mut DuplexStream) -> PlayerAction {
        let mut buf = [0u8; DECISION_LEN];
        dealer.read_exact(&mut buf).await.unwrap();
        match decode_message(&buf).unwrap() {
            Message::Decision(d) => d.action(),
            other => panic!("expected decision, got {other:?}"),
        }
    }

    async fn send_payload(dealer: &mut DuplexStream, payload: GamePayloadMessage) {
        let bytes = encode_message(&Message::GamePayload(payload));
        dealer.write_all(&bytes).await.unwrap();
    }

    fn card(rank: u16, suit: u8) -> Card {
        Card::new(rank, suit).unwrap()
    }

    #[tokio::test]
    async fn test_one_round_stand_reports_win_and_events_in_order() {
        let (mut dealer, mut player) = duplex(1024);
        let (tx, mut rx) = mpsc::channel(64);

        let session = tokio::spawn(async move {
            play_session(&mut player, 1, "events", |_| PlayerAction::Stand, tx).await
        });

        let request = read_session_request(&mut dealer).await;
        assert_eq!(request.rounds, 1);
        assert_eq!(request.identity, "events");

        send_payload(&mut dealer, GamePayloadMessage::card(card(10, 0))).await;
        send_payload(&mut dealer, GamePayloadMessage::card(card(9, 1))).await;
        send_payload(&mut dealer, GamePayloadMessage::card(card(8, 2))).await;
        send_payload(&mut dealer, GamePayloadMessage::turn_prompt()).await;
        assert_eq!(read_decision(&mut dealer).await, PlayerAction::Stand);
        send_payload(&mut dealer, GamePayloadMessage::round_result(RoundOutcome::Win)).await;

        let stats = session.await.unwrap().unwrap();
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.rounds_played(), 1);

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                GameEvent::RoundStarted { round: 1 },
                GameEvent::PlayerCard { card: card(10, 0), total: 10 },
                GameEvent::PlayerCard { card: card(9, 1), total: 19 },
                GameEvent::DealerUpCard { card: card(8, 2) },
                GameEvent::TurnPrompt { total: 19 },
                GameEvent::RoundResult { outcome: RoundOutcome::Win },
            ]
        );
    }

    #[tokio::test]
    async fn test_decider_sees_current_hand_and_hit_cards_accumulate() {
        let (mut dealer, mut player) = duplex(1024);
        let (tx, mut rx) = mpsc::channel(64);

        // Hit once at 12, then stand.
        let session = tokio::spawn(async move {
            play_session(
                &mut player,
                1,
                "hitter",
                |hand: &Hand| {
                    if hand.total() < 15 {
                        PlayerAction::Hit
                    } else {
                        PlayerAction::Stand
                    }
                },
                tx,
            )
            .await
        });

        read_session_request(&mut dealer).await;
        send_payload(&mut dealer, GamePayloadMessage::card(card(10, 0))).await;
        send_payload(&mut dealer, GamePayloadMessage::card(card(2, 1))).await;
        send_payload(&mut dealer, GamePayloadMessage::card(card(7, 2))).await;

        send_payload(&mut dealer, GamePayloadMessage::turn_prompt()).await;
        assert_eq!(read_decision(&mut dealer).await, PlayerAction::Hit);
        send_payload(&mut dealer, GamePayloadMessage::card(card(5, 3))).await;

        send_payload(&mut dealer, GamePayloadMessage::turn_prompt()).await;
        assert_eq!(read_decision(&mut dealer).await, PlayerAction::Stand);
        send_payload(&mut dealer, GamePayloadMessage::round_result(RoundOutcome::Loss)).await;

        let stats = session.await.unwrap().unwrap();
        assert_eq!(stats.losses, 1);

        let mut hit_total = None;
        while let Ok(event) = rx.try_recv() {
            if let GameEvent::HitCard { total, .. } = event {
                hit_total = Some(total);
            }
        }
        // 10 + 2 + 5: the up-card never joins the player's hand.
        assert_eq!(hit_total, Some(17));
    }

    #[tokio::test]
    async fn test_invalid_frames_are_skipped_without_losing_sync() {
        let (mut dealer, mut player) = duplex(1024);
        let (tx, _rx) = mpsc::channel(64);

        let session = tokio::spawn(async move {
            play_session(&mut player, 1, "sync", |_| PlayerAction::Stand, tx).await
        });

        read_session_request(&mut dealer).await;

        // A 9-byte frame with a broken magic cookie, wedged between valid
        // cards. The engine skips it and stays frame-aligned.
        send_payload(&mut dealer, GamePayloadMessage::card(card(10, 0))).await;
        let mut noise = encode_message(&Message::GamePayload(GamePayloadMessage::card(card(4, 0))));
        noise[0] = 0xFF;
        dealer.write_all(&noise).await.unwrap();
        send_payload(&mut dealer, GamePayloadMessage::card(card(9, 1))).await;
        send_payload(&mut dealer, GamePayloadMessage::card(card(8, 2))).await;

        send_payload(&mut dealer, GamePayloadMessage::turn_prompt()).await;
        assert_eq!(read_decision(&mut dealer).await, PlayerAction::Stand);
        send_payload(&mut dealer, GamePayloadMessage::round_result(RoundOutcome::Tie)).await;

        let stats = session.await.unwrap().unwrap();
        assert_eq!(stats.ties, 1);
    }

    #[tokio::test]
    async fn test_multi_round_session_tallies_every_outcome() {
        let (mut dealer, mut player) = duplex(4096);
        let (tx, _rx) = mpsc::channel(256);

        let session = tokio::spawn(async move {
            play_session(&mut player, 3, "tally", |_| PlayerAction::Stand, tx).await
        });

        read_session_request(&mut dealer).await;
        for outcome in [RoundOutcome::Win, RoundOutcome::Loss, RoundOutcome::Tie] {
            send_payload(&mut dealer, GamePayloadMessage::card(card(10, 0))).await;
            send_payload(&mut dealer, GamePayloadMessage::card(card(9, 1))).await;
            send_payload(&mut dealer, GamePayloadMessage::card(card(8, 2))).await;
            send_payload(&mut dealer, GamePayloadMessage::turn_prompt()).await;
            assert_eq!(read_decision(&mut dealer).await, PlayerAction::Stand);
            send_payload(&mut dealer, GamePayloadMessage::round_result(outcome)).await;
        }

        let stats = session.await.unwrap().unwrap();
        assert_eq!((stats.wins, stats.losses, stats.ties), (1, 1, 1));
        assert_eq!(stats.rounds_played(), 3);
    }

    #[tokio::test]
    async fn test_dealer_close_mid_round_aborts() {
        let (mut dealer, mut player) = duplex(1024);
        let (tx, _rx) = mpsc::channel(64);

        let session = tokio::spawn(async move {
            play_session(&mut player, 1, "cutoff", |_| PlayerAction::Stand, tx).await
        });

        read_session_request(&mut dealer).await;
        send_payload(&mut dealer, GamePayloadMessage::card(card(10, 0))).await;
        drop(dealer);

        let err = session.await.unwrap().unwrap_err();
        assert!(matches!(err, SessionError::PeerClosed));
    }

    #[tokio::test]
    async fn test_zero_rounds_sends_request_and_finishes() {
        let (mut dealer, mut player) = duplex(256);
        let (tx, _rx) = mpsc::channel(8);

        let session = tokio::spawn(async move {
            play_session(&mut player, 0, "spectator", |_| PlayerAction::Stand, tx).await
        });

        let request = read_session_request(&mut dealer).await;
        assert_eq!(request.rounds, 0);

        let stats = session.await.unwrap().unwrap();
        assert_eq!(stats.rounds_played(), 0);
    }

    #[tokio::test]
    async fn test_frames_split_across_reads_are_assembled() {
        // A fully mocked stream with the dealer's frames delivered at
        // awkward chunk boundaries; every write the engine makes is
        // asserted byte-for-byte.
        let request = encode_message(&Message::SessionRequest(SessionRequestMessage {
            rounds: 1,
            identity: "mocked".to_string(),
        }));
        let c1 = encode_message(&Message::GamePayload(GamePayloadMessage::card(card(10, 0))));
        let c2 = encode_message(&Message::GamePayload(GamePayloadMessage::card(card(9, 1))));
        let up = encode_message(&Message::GamePayload(GamePayloadMessage::card(card(8, 2))));
        let prompt = encode_message(&Message::GamePayload(GamePayloadMessage::turn_prompt()));
        let stand = encode_message(&Message::Decision(DecisionMessage::new(
            PlayerAction::Stand,
        )));
        let result = encode_message(&Message::GamePayload(GamePayloadMessage::round_result(
            RoundOutcome::Win,
        )));

        let mut stream = tokio_test::io::Builder::new()
            .write(&request)
            .read(&c1[..3])
            .read(&c1[3..])
            .read(&c2)
            .read(&up[..8])
            .read(&up[8..])
            .read(&prompt)
            .write(&stand)
            .read(&result)
            .build();

        let (tx, _rx) = mpsc::channel(64);
        let stats = play_session(&mut stream, 1, "mocked", |_| PlayerAction::Stand, tx)
            .await
            .unwrap();
        assert_eq!(stats.wins, 1);
    }

    #[tokio::test]
    async fn test_dropped_event_receiver_does_not_abort_the_session() {
        let (mut dealer, mut player) = duplex(1024);
        let (tx, rx) = mpsc::channel(64);
        drop(rx);

        let session = tokio::spawn(async move {
            play_session(&mut player, 1, "muted", |_| PlayerAction::Stand, tx).await
        });

        read_session_request(&mut dealer).await;
        send_payload(&mut dealer, GamePayloadMessage::card(card(10, 0))).await;
        send_payload(&mut dealer, GamePayloadMessage::card(card(9, 1))).await;
        send_payload(&mut dealer, GamePayloadMessage::card(card(8, 2))).await;
        send_payload(&mut dealer, GamePayloadMessage::turn_prompt()).await;
        assert_eq!(read_decision(&mut dealer).await, PlayerAction::Stand);
        send_payload(&mut dealer, GamePayloadMessage::round_result(RoundOutcome::Win)).await;

        let stats = session.await.unwrap().unwrap();
        assert_eq!(stats.wins, 1);
    }
}
