//! Domain entities for LAN Blackjack.
//!
//! Pure game logic with no infrastructure dependencies: no sockets, no
//! console, no clocks. Everything here is a plain value or a pure function
//! over plain values, which keeps the round rules testable without a peer
//! on the other end of a connection.
//!
//! The only impurity is randomness, and it lives behind the
//! [`card::CardSource`] trait so callers choose between a real RNG deck and
//! a scripted one.

pub mod card;
pub mod round;
