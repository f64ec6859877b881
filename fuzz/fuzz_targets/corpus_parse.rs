//! Fuzz target for corpus document parsing
//!
//! Arbitrary text goes through `Corpus::from_json`; anything accepted is then
//! walked the way attacks walk it.
//!
//! # Invariants
//!
//! - NEVER panic on malformed documents
//! - Every listed channel yields a non-empty frame slice
//! - Every frame is filed under its own channel
//! - Hex decoding of stored payloads fails cleanly

#![no_main]

use libfuzzer_sys::fuzz_target;
use replayprobe_core::Corpus;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(corpus) = Corpus::from_json(text) else {
        return;
    };

    let mut total = 0;
    for channel in corpus.channels() {
        let frames = corpus.channel_frames(channel).expect("listed channel has frames");
        assert!(!frames.is_empty());
        for frame in frames {
            assert_eq!(frame.channel(), channel);
            let _ = frame.raw_bytes();
        }
        total += frames.len();
    }
    assert_eq!(total, corpus.len());
});
