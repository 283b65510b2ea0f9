//! Protocol module containing the frame types and the binary codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_message, encode_message, ProtocolError};
pub use messages::*;
