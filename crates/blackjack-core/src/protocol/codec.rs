//! Binary codec for encoding and decoding LAN Blackjack frames.
//!
//! Wire formats (all integers big-endian):
//! ```text
//! Offer          [magic:4][0x2][service_port:2][identity:32]        = 39 bytes
//! SessionRequest [magic:4][0x3][rounds:1][identity:32]              = 38 bytes
//! GamePayload    [magic:4][0x4][result:1][rank:2][suit:1]           = 9 bytes
//! Decision       [magic:4][0x4][command:5]                          = 10 bytes
//! ```
//!
//! Frames are fixed-size with no length prefix, so a receiver always knows
//! how many bytes to accumulate before calling [`decode_message`]. The two
//! 0x4 frames travel in opposite directions and are told apart here by
//! length alone.

use thiserror::Error;

use crate::domain::round::RoundOutcome;
use crate::protocol::messages::{
    DecisionMessage, GamePayloadMessage, Message, MessageType, OfferMessage,
    SessionRequestMessage, DECISION_LEN, GAME_PAYLOAD_LEN, IDENTITY_LEN, MAGIC_COOKIE, OFFER_LEN,
    SESSION_REQUEST_LEN,
};

/// Smallest prefix needed before the frame kind is known: magic + type byte.
const PREFIX_LEN: usize = 5;

/// Errors that can occur while decoding a frame.
///
/// `BadMagic` and `UnknownMessageType` mark traffic from another protocol
/// (or corruption); receivers treat them as noise rather than fatal errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Fewer bytes than the frame requires.
    #[error("short frame: need {needed} bytes, got {got}")]
    ShortFrame { needed: usize, got: usize },

    /// The magic cookie does not open the frame.
    #[error("bad magic cookie: 0x{found:08X}")]
    BadMagic { found: u32 },

    /// The type byte is not a recognized value.
    #[error("unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    /// A game-type frame whose length is neither a payload nor a decision.
    #[error("game frame of impossible length {0} (expected 9 or 10)")]
    BadGameFrameLength(usize),

    /// A game payload whose result byte is not 0 or a known outcome code.
    #[error("invalid round result code: {0}")]
    InvalidResultCode(u8),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`Message`] into its fixed-size wire representation.
///
/// Identity strings longer than 32 bytes are truncated; shorter ones are
/// zero-padded.
pub fn encode_message(msg: &Message) -> Vec<u8> {
    let mut buf = Vec::with_capacity(msg.frame_len());
    buf.extend_from_slice(&MAGIC_COOKIE.to_be_bytes());
    buf.push(msg.message_type() as u8);

    match msg {
        Message::Offer(m) => {
            buf.extend_from_slice(&m.service_port.to_be_bytes());
            write_identity(&mut buf, &m.identity);
        }
        Message::SessionRequest(m) => {
            buf.push(m.rounds);
            write_identity(&mut buf, &m.identity);
        }
        Message::GamePayload(m) => {
            buf.push(m.result.map_or(0, |outcome| outcome as u8));
            buf.extend_from_slice(&m.rank.to_be_bytes());
            buf.push(m.suit);
        }
        Message::Decision(m) => {
            buf.extend_from_slice(&m.command);
        }
    }

    debug_assert_eq!(buf.len(), msg.frame_len());
    buf
}

/// Decodes one [`Message`] from `bytes` with a single switch on the type
/// byte.
///
/// `bytes` must contain the whole frame. Trailing bytes beyond the frame's
/// fixed size are tolerated for Offer and SessionRequest (a UDP datagram
/// may be read into an oversized buffer); a game-type slice must be exactly
/// 9 or 10 bytes since its length is what disambiguates the two frame
/// shapes.
///
/// # Errors
///
/// Returns [`ProtocolError`] when the frame is short, the magic cookie is
/// wrong, or the type/result bytes are unknown.
pub fn decode_message(bytes: &[u8]) -> Result<Message, ProtocolError> {
    if bytes.len() < PREFIX_LEN {
        return Err(ProtocolError::ShortFrame {
            needed: PREFIX_LEN,
            got: bytes.len(),
        });
    }

    let found = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if found != MAGIC_COOKIE {
        return Err(ProtocolError::BadMagic { found });
    }

    let type_byte = bytes[4];
    let msg_type = MessageType::try_from(type_byte)
        .map_err(|_| ProtocolError::UnknownMessageType(type_byte))?;

    match msg_type {
        MessageType::Offer => {
            require_len(bytes, OFFER_LEN)?;
            let service_port = u16::from_be_bytes([bytes[5], bytes[6]]);
            let identity = read_identity(&bytes[7..7 + IDENTITY_LEN]);
            Ok(Message::Offer(OfferMessage {
                service_port,
                identity,
            }))
        }
        MessageType::SessionRequest => {
            require_len(bytes, SESSION_REQUEST_LEN)?;
            let rounds = bytes[5];
            let identity = read_identity(&bytes[6..6 + IDENTITY_LEN]);
            Ok(Message::SessionRequest(SessionRequestMessage {
                rounds,
                identity,
            }))
        }
        MessageType::Game => match bytes.len() {
            GAME_PAYLOAD_LEN => {
                let result = match bytes[5] {
                    0 => None,
                    code => Some(
                        RoundOutcome::try_from(code)
                            .map_err(|e| ProtocolError::InvalidResultCode(e.0))?,
                    ),
                };
                let rank = u16::from_be_bytes([bytes[6], bytes[7]]);
                let suit = bytes[8];
                Ok(Message::GamePayload(GamePayloadMessage {
                    result,
                    rank,
                    suit,
                }))
            }
            DECISION_LEN => {
                let mut command = [0u8; 5];
                command.copy_from_slice(&bytes[5..10]);
                Ok(Message::Decision(DecisionMessage { command }))
            }
            other => Err(ProtocolError::BadGameFrameLength(other)),
        },
    }
}

// ── Field helpers ─────────────────────────────────────────────────────────────

fn require_len(buf: &[u8], needed: usize) -> Result<(), ProtocolError> {
    if buf.len() < needed {
        Err(ProtocolError::ShortFrame {
            needed,
            got: buf.len(),
        })
    } else {
        Ok(())
    }
}

/// Writes `s` as a 32-byte zero-padded field, truncating over-long input.
fn write_identity(buf: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    let len = bytes.len().min(IDENTITY_LEN);
    buf.extend_from_slice(&bytes[..len]);
    buf.resize(buf.len() + (IDENTITY_LEN - len), 0);
}

/// Reads a 32-byte zero-padded identity field, stopping at the first NUL.
///
/// Non-UTF-8 bytes are replaced rather than rejected; identity matching is
/// an exact string comparison downstream, so garbage simply never matches.
fn read_identity(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
