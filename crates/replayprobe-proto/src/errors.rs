//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while parsing or serializing decoder messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer ends before the structure being parsed.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes required
        expected: usize,
        /// Bytes available
        actual: usize,
    },

    /// First header byte is not the `%` magic.
    #[error("invalid magic byte {0:#04x}")]
    InvalidMagic(u8),

    /// Opcode byte does not name a known message type.
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    /// Body does not fit in the 16-bit length field.
    #[error("message body too large: {size} bytes (max {max})")]
    BodyTooLarge {
        /// Actual body length
        size: usize,
        /// Largest encodable body
        max: usize,
    },
}
