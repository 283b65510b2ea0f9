//! Persistence: the player's TOML configuration file.

pub mod config;
