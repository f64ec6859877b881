//! Corpus fixtures.
//!
//! Frames use the device layout `channel: u32 LE | timestamp: u64 LE |
//! payload`, so the same corpus drives both [`ScriptedDecoder`] and
//! [`SimDevice`].
//!
//! [`ScriptedDecoder`]: crate::ScriptedDecoder
//! [`SimDevice`]: crate::SimDevice

use std::{collections::BTreeMap, io, path::Path};

use replayprobe_core::{ChannelId, Corpus, Frame};
use serde_json::{Value, json};

/// Bytes preceding the payload in a packed frame.
pub const FRAME_HEADER_SIZE: usize = 12;

/// Pack a frame in the device layout.
pub fn pack_frame(channel: ChannelId, timestamp: u64, payload: &[u8]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    raw.extend_from_slice(&channel.to_le_bytes());
    raw.extend_from_slice(&timestamp.to_le_bytes());
    raw.extend_from_slice(payload);
    raw
}

/// Split a packed frame into `(channel, timestamp, payload)`.
///
/// `None` if the frame is shorter than [`FRAME_HEADER_SIZE`].
pub fn unpack_frame(raw: &[u8]) -> Option<(ChannelId, u64, &[u8])> {
    let channel = ChannelId::from_le_bytes(raw.get(0..4)?.try_into().ok()?);
    let timestamp = u64::from_le_bytes(raw.get(4..12)?.try_into().ok()?);
    Some((channel, timestamp, raw.get(FRAME_HEADER_SIZE..)?))
}

/// Builder for test corpora.
///
/// Frames are kept per channel in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct CorpusBuilder {
    channels: BTreeMap<ChannelId, Vec<(u64, String)>>,
}

impl CorpusBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a well-formed frame whose payload is `payload`.
    #[must_use]
    pub fn frame(self, channel: ChannelId, timestamp: u64, payload: &[u8]) -> Self {
        let encoded = hex::encode(pack_frame(channel, timestamp, payload));
        self.encoded(channel, timestamp, encoded)
    }

    /// Add a frame with an arbitrary (possibly invalid) `encoded` string.
    #[must_use]
    pub fn encoded(
        mut self,
        channel: ChannelId,
        timestamp: u64,
        encoded: impl Into<String>,
    ) -> Self {
        self.channels.entry(channel).or_default().push((timestamp, encoded.into()));
        self
    }

    /// Build the corpus directly.
    pub fn build(&self) -> Corpus {
        Corpus::from_frames(self.channels.iter().flat_map(|(channel, frames)| {
            frames.iter().map(|(timestamp, encoded)| Frame::new(*channel, *timestamp, encoded))
        }))
    }

    /// Channel-keyed JSON document.
    pub fn to_json(&self) -> Value {
        let channels: serde_json::Map<String, Value> = self
            .channels
            .iter()
            .map(|(channel, frames)| (channel.to_string(), records(frames)))
            .collect();
        Value::Object(channels)
    }

    /// Channel-indexed JSON document. Gaps become empty lists.
    pub fn to_indexed_json(&self) -> Value {
        let Some(&highest) = self.channels.keys().next_back() else {
            return Value::Array(Vec::new());
        };
        let channels = (0..=highest)
            .map(|channel| self.channels.get(&channel).map_or_else(|| json!([]), |f| records(f)))
            .collect();
        Value::Array(channels)
    }

    /// Write the channel-keyed document to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        std::fs::write(path, self.to_json().to_string())
    }
}

fn records(frames: &[(u64, String)]) -> Value {
    frames
        .iter()
        .map(|(timestamp, encoded)| json!({ "timestamp": timestamp, "encoded": encoded }))
        .collect()
}
