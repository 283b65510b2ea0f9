//! Network services: the UDP offer broadcaster and the TCP session acceptor.

pub mod acceptor;
pub mod broadcast;
