//! Infrastructure layer for the dealer: sockets, threads, and config files.

pub mod network;
pub mod storage;
