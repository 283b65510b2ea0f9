//! Persistence: the dealer's TOML configuration file.

pub mod config;
