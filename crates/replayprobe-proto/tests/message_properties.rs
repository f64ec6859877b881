//! Property-based tests for message parsing.
//!
//! The host parses whatever a possibly-misbehaving device sends, so parsing
//! must never panic and must only accept well-formed headers.

use proptest::prelude::*;
use replayprobe_proto::{Message, MessageHeader, Opcode, ProtocolError};

fn arbitrary_opcode() -> impl Strategy<Value = Opcode> {
    prop_oneof![
        Just(Opcode::Decode),
        Just(Opcode::Subscribe),
        Just(Opcode::List),
        Just(Opcode::Ack),
        Just(Opcode::Debug),
        Just(Opcode::Error),
    ]
}

proptest! {
    #[test]
    fn prop_decode_arbitrary_bytes_never_panics(
        bytes in prop::collection::vec(any::<u8>(), 0..64)
    ) {
        let _ = Message::decode(&bytes);
    }

    #[test]
    fn prop_accepted_headers_start_with_magic(bytes in prop::collection::vec(any::<u8>(), 4..16)) {
        if let Ok(header) = MessageHeader::from_bytes(&bytes) {
            prop_assert_eq!(bytes[0], MessageHeader::MAGIC);
            prop_assert!(header.opcode().is_some());
        }
    }

    #[test]
    fn prop_encoded_message_parses_back(
        opcode in arbitrary_opcode(),
        body in prop::collection::vec(any::<u8>(), 0..1024),
    ) {
        let message = Message::new(opcode, body);
        let mut buf = Vec::new();
        message.encode(&mut buf).expect("body fits in u16");

        prop_assert_eq!(buf.len(), MessageHeader::SIZE + message.body.len());
        prop_assert_eq!(Message::decode(&buf), Ok(message));
    }

    #[test]
    fn prop_chunks_reassemble_body(body in prop::collection::vec(any::<u8>(), 0..2048)) {
        let message = Message::new(Opcode::Decode, body.clone());
        let joined: Vec<u8> = message.chunks().flatten().copied().collect();
        prop_assert_eq!(joined, body);
        prop_assert!(message.chunks().all(|chunk| chunk.len() <= replayprobe_proto::CHUNK_SIZE));
    }
}

#[test]
fn non_magic_prefix_is_rejected_not_skipped() {
    // Resynchronisation on noise is the transport's job; the parser is strict.
    let bytes = [0x00, b'%', b'A', 0, 0];
    assert_eq!(Message::decode(&bytes), Err(ProtocolError::InvalidMagic(0x00)));
}
