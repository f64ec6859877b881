//! Message header with zero-copy parsing.
//!
//! The header is 4 bytes: magic `%`, opcode, and a little-endian `u16` body
//! length. Little endian matches the device's native byte order.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    Opcode,
    errors::{ProtocolError, Result},
};

/// Fixed 4-byte message header.
///
/// # Security
///
/// The `#[repr(C, packed)]` layout means every 4-byte pattern is a valid
/// value, so bytes read off the wire can be cast without copying. Magic and
/// opcode are validated in [`MessageHeader::from_bytes`]; the length is a
/// `u16` and therefore bounded by construction.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct MessageHeader {
    magic: u8,       // b'%'
    opcode: u8,      // Opcode byte
    length: [u8; 2], // u16 body length, little endian
}

impl MessageHeader {
    /// Size of the serialized header.
    pub const SIZE: usize = 4;

    /// Magic byte that starts every message.
    pub const MAGIC: u8 = b'%';

    /// Largest body a single message can describe.
    pub const MAX_BODY_SIZE: usize = u16::MAX as usize;

    /// Create a header for a body of `length` bytes.
    #[must_use]
    pub fn new(opcode: Opcode, length: u16) -> Self {
        Self { magic: Self::MAGIC, opcode: opcode.to_u8(), length: length.to_le_bytes() }
    }

    /// Parse a header from the start of `bytes`.
    ///
    /// Trailing bytes are ignored.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Truncated` if fewer than 4 bytes are available
    /// - `ProtocolError::InvalidMagic` if the first byte is not `%`
    /// - `ProtocolError::UnknownOpcode` if the opcode byte is unrecognized
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        let header = Self::ref_from_prefix(bytes)
            .map_err(|_| ProtocolError::Truncated { expected: Self::SIZE, actual: bytes.len() })?
            .0;

        if header.magic != Self::MAGIC {
            return Err(ProtocolError::InvalidMagic(header.magic));
        }

        if Opcode::from_u8(header.opcode).is_none() {
            return Err(ProtocolError::UnknownOpcode(header.opcode));
        }

        Ok(header)
    }

    /// Serialize header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(IntoBytes::as_bytes(self));
        arr
    }

    /// Opcode as raw byte.
    #[must_use]
    pub fn opcode_byte(&self) -> u8 {
        self.opcode
    }

    /// Opcode as enum. `None` if unrecognized.
    #[must_use]
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_u8(self.opcode)
    }

    /// Body length in bytes.
    #[must_use]
    pub fn body_len(&self) -> u16 {
        u16::from_le_bytes(self.length)
    }
}

// Manual Debug implementation (can't derive due to packed repr)
impl std::fmt::Debug for MessageHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageHeader")
            .field("magic", &format!("{:#04x}", self.magic))
            .field("opcode", &format!("{:#04x}", self.opcode))
            .field("body_len", &self.body_len())
            .finish()
    }
}

// Manual PartialEq implementation (can't derive due to packed repr)
impl PartialEq for MessageHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for MessageHeader {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_size() {
        assert_eq!(std::mem::size_of::<MessageHeader>(), MessageHeader::SIZE);
    }

    #[test]
    fn layout_is_magic_opcode_length_le() {
        let header = MessageHeader::new(Opcode::Decode, 0x0140);
        assert_eq!(header.to_bytes(), [b'%', b'D', 0x40, 0x01]);
    }

    #[test]
    fn parses_valid_header_and_ignores_trailing_bytes() {
        let bytes = [b'%', b'E', 0x05, 0x00, 0xAA, 0xBB];
        let header = MessageHeader::from_bytes(&bytes).expect("valid header");
        assert_eq!(header.opcode(), Some(Opcode::Error));
        assert_eq!(header.body_len(), 5);
    }

    #[test]
    fn reject_short_buffer() {
        let result = MessageHeader::from_bytes(&[b'%', b'A']);
        assert_eq!(result, Err(ProtocolError::Truncated { expected: 4, actual: 2 }));
    }

    #[test]
    fn reject_invalid_magic() {
        let result = MessageHeader::from_bytes(&[b'#', b'A', 0, 0]);
        assert_eq!(result, Err(ProtocolError::InvalidMagic(b'#')));
    }

    #[test]
    fn reject_unknown_opcode() {
        let result = MessageHeader::from_bytes(&[b'%', b'Z', 0, 0]);
        assert_eq!(result, Err(ProtocolError::UnknownOpcode(b'Z')));
    }
}
