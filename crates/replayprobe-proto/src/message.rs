//! Complete decoder messages.

use bytes::{BufMut, Bytes};

use crate::{
    MessageHeader, Opcode,
    errors::{ProtocolError, Result},
};

/// Largest body slice sent before waiting for an acknowledgement.
pub const CHUNK_SIZE: usize = 256;

/// A header plus body.
///
/// Layout on the wire: `[MessageHeader: 4 bytes] + [body: body_len bytes]`,
/// with the body split into [`CHUNK_SIZE`] slices by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message type
    pub opcode: Opcode,
    /// Raw body bytes
    pub body: Bytes,
}

impl Message {
    /// Create a message.
    pub fn new(opcode: Opcode, body: impl Into<Bytes>) -> Self {
        Self { opcode, body: body.into() }
    }

    /// Empty acknowledgement.
    #[must_use]
    pub fn ack() -> Self {
        Self::new(Opcode::Ack, Bytes::new())
    }

    /// Header describing this message.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::BodyTooLarge` if the body exceeds `u16::MAX` bytes
    pub fn header(&self) -> Result<MessageHeader> {
        let length = u16::try_from(self.body.len()).map_err(|_| ProtocolError::BodyTooLarge {
            size: self.body.len(),
            max: MessageHeader::MAX_BODY_SIZE,
        })?;
        Ok(MessageHeader::new(self.opcode, length))
    }

    /// Encode header and body contiguously.
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let header = self.header()?;
        dst.put_slice(&header.to_bytes());
        dst.put_slice(&self.body);
        Ok(())
    }

    /// Decode a contiguous message. Trailing bytes are ignored.
    ///
    /// # Errors
    ///
    /// - Any header error from [`MessageHeader::from_bytes`]
    /// - `ProtocolError::Truncated` if fewer body bytes follow than the header
    ///   claims
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header = MessageHeader::from_bytes(bytes)?;
        let opcode = header
            .opcode()
            .ok_or_else(|| ProtocolError::UnknownOpcode(header.opcode_byte()))?;

        let total = MessageHeader::SIZE + header.body_len() as usize;
        let body = bytes
            .get(MessageHeader::SIZE..total)
            .ok_or(ProtocolError::Truncated { expected: total, actual: bytes.len() })?;

        Ok(Self::new(opcode, Bytes::copy_from_slice(body)))
    }

    /// Body slices in transmission order.
    pub fn chunks(&self) -> impl Iterator<Item = &[u8]> {
        self.body.chunks(CHUNK_SIZE)
    }

    /// Body interpreted as text, with invalid UTF-8 replaced.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_is_empty_header_only() {
        let mut buf = Vec::new();
        Message::ack().encode(&mut buf).expect("ack encodes");
        assert_eq!(buf, [b'%', b'A', 0, 0]);
    }

    #[test]
    fn body_splits_into_256_byte_chunks() {
        let message = Message::new(Opcode::Decode, vec![7u8; 600]);
        let sizes: Vec<_> = message.chunks().map(<[u8]>::len).collect();
        assert_eq!(sizes, vec![256, 256, 88]);
    }

    #[test]
    fn empty_body_has_no_chunks() {
        assert_eq!(Message::ack().chunks().count(), 0);
    }

    #[test]
    fn oversized_body_is_rejected() {
        let message = Message::new(Opcode::Decode, vec![0u8; MessageHeader::MAX_BODY_SIZE + 1]);
        assert!(matches!(message.header(), Err(ProtocolError::BodyTooLarge { .. })));
    }

    #[test]
    fn truncated_body_is_rejected() {
        let bytes = [b'%', b'D', 0x04, 0x00, 1, 2];
        assert_eq!(
            Message::decode(&bytes),
            Err(ProtocolError::Truncated { expected: 8, actual: 6 })
        );
    }

    #[test]
    fn error_body_reads_as_text() {
        let message = Message::new(Opcode::Error, &b"replayed frame"[..]);
        assert_eq!(message.body_text(), "replayed frame");
    }
}
