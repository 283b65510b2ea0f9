//! Infrastructure layer for the player: sockets, threads, and config files.

pub mod network;
pub mod storage;
