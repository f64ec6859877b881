//! Channel-partitioned frame corpus.
//!
//! Two document shapes are accepted:
//!
//! ```text
//! {"0": [{"timestamp": 100, "encoded": "..."}, ...], "1": [...]}
//! [[{"timestamp": 100, "encoded": "..."}, ...], [...]]
//! ```
//!
//! In the array form a channel's id is its index. Within a channel, records
//! keep their document order, which is the order they were captured in and
//! the ground truth for "legitimate" ordering.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{ChannelNotFound, CorpusLoadError},
    frame::{ChannelId, Frame},
};

#[derive(Deserialize)]
struct FrameRecord {
    timestamp: u64,
    encoded: String,
    #[serde(default)]
    channel: Option<ChannelId>,
}

/// Immutable collection of captured frames grouped by channel.
///
/// # Invariants
///
/// - Frames within a channel are never reordered after load.
/// - Every stored frame's `channel()` equals the channel it is filed under.
/// - Channels listed with no frames are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    channels: BTreeMap<ChannelId, Vec<Frame>>,
}

impl Corpus {
    /// Load a corpus document from disk.
    ///
    /// Payloads are not hex-decoded here; see [`Frame::raw_bytes`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CorpusLoadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| CorpusLoadError::Read { path: path.to_path_buf(), source })?;

        let corpus = Self::from_json(&text)?;
        tracing::info!(
            path = %path.display(),
            channels = corpus.channels.len(),
            frames = corpus.len(),
            "corpus loaded"
        );
        Ok(corpus)
    }

    /// Parse a corpus document held in memory.
    pub fn from_json(text: &str) -> Result<Self, CorpusLoadError> {
        let document: Value = serde_json::from_str(text)?;

        let entries: Vec<(ChannelId, Value)> = match document {
            Value::Object(map) => map
                .into_iter()
                .map(|(key, records)| Ok((parse_channel_key(&key)?, records)))
                .collect::<Result<_, CorpusLoadError>>()?,
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, records)| {
                    let channel = ChannelId::try_from(index)
                        .map_err(|_| CorpusLoadError::InvalidChannel { key: index.to_string() })?;
                    Ok((channel, records))
                })
                .collect::<Result<_, CorpusLoadError>>()?,
            other => return Err(CorpusLoadError::Structure { found: json_kind(&other) }),
        };

        let mut seen = BTreeSet::new();
        let mut channels = BTreeMap::new();
        for (channel, records) in entries {
            if !seen.insert(channel) {
                return Err(CorpusLoadError::DuplicateChannel { channel });
            }
            let frames = parse_channel(channel, records)?;
            if !frames.is_empty() {
                channels.insert(channel, frames);
            }
        }

        Ok(Self { channels })
    }

    /// Build a corpus from frames, grouping by channel in iteration order.
    pub fn from_frames(frames: impl IntoIterator<Item = Frame>) -> Self {
        let mut channels: BTreeMap<ChannelId, Vec<Frame>> = BTreeMap::new();
        for frame in frames {
            channels.entry(frame.channel()).or_default().push(frame);
        }
        Self { channels }
    }

    /// Frames captured on `channel`, in capture order.
    ///
    /// # Errors
    ///
    /// - `ChannelNotFound` if the channel is absent or has no frames. Never
    ///   returns an empty slice.
    pub fn channel_frames(&self, channel: ChannelId) -> Result<&[Frame], ChannelNotFound> {
        self.channels
            .get(&channel)
            .filter(|frames| !frames.is_empty())
            .map(Vec::as_slice)
            .ok_or(ChannelNotFound { channel })
    }

    /// Channels with at least one frame, ascending.
    pub fn channels(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.channels.iter().filter(|(_, frames)| !frames.is_empty()).map(|(channel, _)| *channel)
    }

    /// Total number of frames across all channels.
    pub fn len(&self) -> usize {
        self.channels.values().map(Vec::len).sum()
    }

    /// Check if the corpus holds no frames at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_channel_key(key: &str) -> Result<ChannelId, CorpusLoadError> {
    key.trim()
        .parse::<ChannelId>()
        .map_err(|_| CorpusLoadError::InvalidChannel { key: key.to_string() })
}

fn parse_channel(channel: ChannelId, records: Value) -> Result<Vec<Frame>, CorpusLoadError> {
    let Value::Array(records) = records else {
        return Err(CorpusLoadError::ChannelNotList { channel, found: json_kind(&records) });
    };

    let mut frames = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let record: FrameRecord = serde_json::from_value(record)
            .map_err(|source| CorpusLoadError::Record { channel, index, source })?;

        if let Some(claimed) = record.channel
            && claimed != channel
        {
            return Err(CorpusLoadError::ChannelMismatch { channel, index, claimed });
        }

        frames.push(Frame::new(channel, record.timestamp, record.encoded));
    }
    Ok(frames)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
