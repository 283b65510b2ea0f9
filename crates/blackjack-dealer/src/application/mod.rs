//! Application layer use cases for the dealer.
//!
//! The single use case here is [`run_session::run_session`]: drive one full
//! multi-round blackjack session over one already-accepted connection. It
//! performs no socket setup itself; the stream and the card supply are
//! injected, so the whole state machine runs unchanged against an
//! in-memory duplex stream and a scripted deck in tests.

pub mod run_session;
