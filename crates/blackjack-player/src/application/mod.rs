//! Application layer use cases for the player.
//!
//! The single use case is [`play_session::play_session`]: play one full
//! session against a dealer over an already-connected stream. Decisions
//! and presentation are both injected (a closure answers turn prompts,
//! an event channel carries everything worth showing), so the whole
//! flow runs unchanged against an in-memory duplex stream in tests.

pub mod play_session;
