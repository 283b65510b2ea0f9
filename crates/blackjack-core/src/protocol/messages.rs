//! All LAN Blackjack protocol frame types.
//!
//! The protocol uses four fixed-length frames, each prefixed with the same
//! 4-byte magic cookie and a type byte. There is no length prefix and no
//! version field; every frame size is known from its type byte alone (the
//! two game-channel frames share a type byte but travel in opposite
//! directions and differ in length).
//!
//! All multi-byte integers are big-endian. Identity fields are 32 bytes of
//! zero-padded ASCII.

use crate::domain::card::Card;
use crate::domain::round::RoundOutcome;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Magic cookie opening every frame; traffic without it is noise.
pub const MAGIC_COOKIE: u32 = 0xABCD_DCBA;

/// Byte width of the identity field in Offer and SessionRequest frames.
pub const IDENTITY_LEN: usize = 32;

/// Total size of an Offer frame: magic(4) + type(1) + port(2) + identity(32).
pub const OFFER_LEN: usize = 39;

/// Total size of a SessionRequest frame: magic(4) + type(1) + rounds(1) + identity(32).
pub const SESSION_REQUEST_LEN: usize = 38;

/// Total size of a GamePayload frame: magic(4) + type(1) + result(1) + rank(2) + suit(1).
pub const GAME_PAYLOAD_LEN: usize = 9;

/// Total size of a Decision frame: magic(4) + type(1) + command(5).
pub const DECISION_LEN: usize = 10;

/// The Hit command token; any other 5-byte command means Stand.
pub const HIT_COMMAND: [u8; 5] = *b"Hittt";

/// The Stand token the player sends (the dealer accepts any non-Hit bytes).
pub const STAND_COMMAND: [u8; 5] = *b"Stand";

// ── Message type codes ────────────────────────────────────────────────────────

/// Frame type codes carried in the byte after the magic cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Dealer presence broadcast (UDP).
    Offer = 0x2,
    /// Player's opening request on a fresh connection (TCP).
    SessionRequest = 0x3,
    /// Both game-channel frames: dealer payloads and player decisions (TCP).
    Game = 0x4,
}

impl TryFrom<u8> for MessageType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x2 => Ok(MessageType::Offer),
            0x3 => Ok(MessageType::SessionRequest),
            0x4 => Ok(MessageType::Game),
            _ => Err(()),
        }
    }
}

// ── Per-frame payload structs ─────────────────────────────────────────────────

/// OFFER (0x2): broadcast by a dealer once per second on the discovery port.
///
/// Each datagram is independently authoritative; there are no sequence
/// numbers and no expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferMessage {
    /// TCP port the dealer accepts game connections on.
    pub service_port: u16,
    /// Dealer identity token; players only act on offers whose identity
    /// matches their configured expectation.
    pub identity: String,
}

/// SESSION_REQUEST (0x3): the first and only handshake frame, sent by the
/// player immediately after connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequestMessage {
    /// Number of rounds to play in this session.
    pub rounds: u8,
    /// Player identity token, echoing the matched offer.
    pub identity: String,
}

/// GAME_PAYLOAD (0x4, 9 bytes): the dealer's only frame shape.
///
/// One layout serves three purposes, distinguished by which fields are
/// zero:
///
/// - `rank > 0`: a dealt card for the player's view.
/// - `rank == 0`, `result == None`: a turn prompt ("your move").
/// - `result == Some(_)`: the round's terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GamePayloadMessage {
    /// Round outcome; `None` mid-round (wire byte 0).
    pub result: Option<RoundOutcome>,
    /// Card rank, or 0 for control and result frames.
    pub rank: u16,
    /// Card suit; meaningless when `rank == 0`.
    pub suit: u8,
}

impl GamePayloadMessage {
    /// A frame delivering one dealt card.
    pub fn card(card: Card) -> Self {
        Self {
            result: None,
            rank: u16::from(card.rank),
            suit: card.suit,
        }
    }

    /// The "your move" control frame.
    pub fn turn_prompt() -> Self {
        Self {
            result: None,
            rank: 0,
            suit: 0,
        }
    }

    /// The terminal frame of a round.
    pub fn round_result(outcome: RoundOutcome) -> Self {
        Self {
            result: Some(outcome),
            rank: 0,
            suit: 0,
        }
    }

    /// The card this frame delivers, if any.
    ///
    /// Returns `None` for control/result frames and for frames whose
    /// rank/suit do not form a valid card.
    pub fn dealt_card(&self) -> Option<Card> {
        if self.rank == 0 {
            return None;
        }
        Card::new(self.rank, self.suit).ok()
    }

    /// `true` for the turn-prompt control frame.
    pub fn is_turn_prompt(&self) -> bool {
        self.result.is_none() && self.rank == 0
    }
}

/// The player's choice during the decision loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Hit,
    Stand,
}

impl PlayerAction {
    /// Interprets a wire command.
    ///
    /// Only the exact Hit token hits; every other 5-byte value is Stand.
    /// This permissiveness is part of the protocol's observable behavior
    /// and is kept deliberately.
    pub fn from_command(command: [u8; 5]) -> Self {
        if command == HIT_COMMAND {
            PlayerAction::Hit
        } else {
            PlayerAction::Stand
        }
    }

    /// The canonical wire command for this action.
    pub fn command(self) -> [u8; 5] {
        match self {
            PlayerAction::Hit => HIT_COMMAND,
            PlayerAction::Stand => STAND_COMMAND,
        }
    }
}

/// DECISION (0x4, 10 bytes): the player's Hit/Stand answer to a turn prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionMessage {
    /// Raw 5-byte command as received.
    pub command: [u8; 5],
}

impl DecisionMessage {
    /// Builds a decision frame for an action.
    pub fn new(action: PlayerAction) -> Self {
        Self {
            command: action.command(),
        }
    }

    /// The action this command encodes.
    pub fn action(&self) -> PlayerAction {
        PlayerAction::from_command(self.command)
    }
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// All valid LAN Blackjack frames, discriminated by type byte (and, for the
/// shared game type byte, by frame length).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Offer(OfferMessage),
    SessionRequest(SessionRequestMessage),
    GamePayload(GamePayloadMessage),
    Decision(DecisionMessage),
}

impl Message {
    /// Returns the [`MessageType`] byte for this frame.
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Offer(_) => MessageType::Offer,
            Message::SessionRequest(_) => MessageType::SessionRequest,
            Message::GamePayload(_) | Message::Decision(_) => MessageType::Game,
        }
    }

    /// Returns the fixed encoded size of this frame in bytes.
    pub fn frame_len(&self) -> usize {
        match self {
            Message::Offer(_) => OFFER_LEN,
            Message::SessionRequest(_) => SESSION_REQUEST_LEN,
            Message::GamePayload(_) => GAME_PAYLOAD_LEN,
            Message::Decision(_) => DECISION_LEN,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
