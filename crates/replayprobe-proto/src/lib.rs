//! Wire protocol spoken between the probing host and a decoder device.
//!
//! Every exchange is a [`Message`]: a 4-byte [`MessageHeader`] followed by a
//! body of up to `u16::MAX` bytes. Bodies cross the wire in chunks of at most
//! [`CHUNK_SIZE`] bytes, and the receiver acknowledges the header and every
//! chunk with an empty [`Opcode::Ack`] message (except for `Ack` and `Debug`
//! messages, which are never acknowledged).
//!
//! This crate is Sans-IO: it only parses and serializes. The ACK choreography
//! itself is driven by `replayprobe-client`.

#![forbid(unsafe_code)]

pub mod errors;
pub mod header;
pub mod message;
pub mod opcode;

pub use errors::{ProtocolError, Result};
pub use header::MessageHeader;
pub use message::{CHUNK_SIZE, Message};
pub use opcode::Opcode;
