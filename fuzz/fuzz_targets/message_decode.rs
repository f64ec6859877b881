//! Fuzz target for decoder message parsing
//!
//! # Strategy
//!
//! - Raw bytes: arbitrary input straight into `Message::decode`
//! - Lying length: valid magic and opcode with a length that disagrees with
//!   the bytes that follow
//! - Re-encode: any message that decodes must encode back to the same prefix
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - Accepted headers always start with the magic byte
//! - Decoded body length equals the header's claimed length

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use replayprobe_proto::{Message, MessageHeader, Opcode};

#[derive(Debug, Arbitrary)]
enum Input {
    RawBytes(Vec<u8>),
    LyingLength { opcode: u8, claimed: u16, body: Vec<u8> },
}

const OPCODES: [Opcode; 6] =
    [Opcode::Decode, Opcode::Subscribe, Opcode::List, Opcode::Ack, Opcode::Debug, Opcode::Error];

fuzz_target!(|input: Input| {
    let bytes = match input {
        Input::RawBytes(bytes) => bytes,
        Input::LyingLength { opcode, claimed, body } => {
            let opcode = OPCODES[opcode as usize % OPCODES.len()];
            let mut bytes = MessageHeader::new(opcode, claimed).to_bytes().to_vec();
            bytes.extend_from_slice(&body);
            bytes
        }
    };

    if let Ok(header) = MessageHeader::from_bytes(&bytes) {
        assert_eq!(header.to_bytes()[0], MessageHeader::MAGIC);
    }

    if let Ok(message) = Message::decode(&bytes) {
        let header = message.header().expect("decoded body fits in u16");
        let claimed = MessageHeader::SIZE + header.body_len() as usize;
        assert_eq!(message.body.len(), header.body_len() as usize);

        let mut encoded = Vec::new();
        message.encode(&mut encoded).expect("decoded message re-encodes");
        assert_eq!(encoded, bytes[..claimed]);
    }
});
