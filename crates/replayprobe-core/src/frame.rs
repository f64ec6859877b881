//! Captured frames.

use crate::error::FrameError;

/// Logical broadcast channel identifier.
pub type ChannelId = u32;

/// One captured frame.
///
/// The payload stays hex-encoded until an attack actually submits the frame;
/// see [`Frame::raw_bytes`]. Fields are private so a loaded frame's
/// `(channel, timestamp)` can never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    channel: ChannelId,
    timestamp: u64,
    encoded: String,
}

impl Frame {
    /// Create a frame from its hex-encoded payload.
    pub fn new(channel: ChannelId, timestamp: u64, encoded: impl Into<String>) -> Self {
        Self { channel, timestamp, encoded: encoded.into() }
    }

    /// Create a frame from raw payload bytes.
    pub fn from_raw(channel: ChannelId, timestamp: u64, raw: impl AsRef<[u8]>) -> Self {
        Self::new(channel, timestamp, hex::encode(raw))
    }

    /// Channel the frame was captured on.
    #[must_use]
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Capture timestamp.
    #[must_use]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Payload exactly as it appeared in the corpus.
    #[must_use]
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Decode the hex payload into the bytes submitted to the decoder.
    ///
    /// # Errors
    ///
    /// - `FrameError::MalformedPayload` if `encoded` is not valid hex
    pub fn raw_bytes(&self) -> Result<Vec<u8>, FrameError> {
        hex::decode(&self.encoded).map_err(|source| FrameError::MalformedPayload {
            channel: self.channel,
            timestamp: self.timestamp,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_bytes_decodes_hex() {
        let frame = Frame::new(1, 10, "00ff10");
        assert_eq!(frame.raw_bytes(), Ok(vec![0x00, 0xFF, 0x10]));
    }

    #[test]
    fn from_raw_round_trips_payload() {
        let frame = Frame::from_raw(2, 20, [0xDE, 0xAD]);
        assert_eq!(frame.encoded(), "dead");
        assert_eq!(frame.raw_bytes(), Ok(vec![0xDE, 0xAD]));
    }

    #[test]
    fn malformed_hex_is_reported_with_frame_identity() {
        let frame = Frame::new(3, 30, "zz");
        let err = frame.raw_bytes().expect_err("not hex");
        assert_eq!(
            err.to_string(),
            "channel 3 frame at timestamp 30 has a non-hex payload"
        );
    }

    #[test]
    fn odd_length_hex_is_malformed() {
        assert!(Frame::new(0, 0, "abc").raw_bytes().is_err());
    }
}
