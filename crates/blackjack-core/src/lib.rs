//! # blackjack-core
//!
//! Shared library for LAN Blackjack containing the wire protocol codec and
//! the game domain rules.
//!
//! This crate is used by both the dealer and player applications. It has
//! zero dependencies on sockets, the console, or any other OS facility, so
//! every rule it encodes can be unit-tested in isolation.
//!
//! - **`domain`** – Pure game logic: cards, hands, the dealer's draw rule,
//!   and round outcome judgement. The card supply sits behind the
//!   [`CardSource`] trait so the session engine can be driven by a scripted
//!   deck in tests.
//!
//! - **`protocol`** – How bytes travel over the network. The four
//!   fixed-length frame types are encoded into a compact binary layout
//!   (magic cookie + type byte + fields, all big-endian) and decoded back
//!   into typed Rust values on the other end.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `blackjack_core::Card` instead of `blackjack_core::domain::card::Card`.
pub use domain::card::{Card, CardError, CardSource, Hand, RandomDeck, ScriptedDeck};
pub use domain::round::{RoundOutcome, SessionStats, BUST_LIMIT, DEALER_STAND_TOTAL};
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::{Message, PlayerAction};
