//! Error types for corpus loading, decoding and attack execution.
//!
//! Display strings describe only their own layer. Wrapped causes are exposed
//! through `source()` so the reporter can print the full chain without
//! repeating text.

use std::{io, path::PathBuf, time::Duration};

use replayprobe_proto::ProtocolError;
use thiserror::Error;

use crate::{decoder::Direction, frame::ChannelId};

/// Corpus could not be loaded. Fatal: no attack can run without a corpus.
#[derive(Error, Debug)]
pub enum CorpusLoadError {
    /// Corpus file is missing or unreadable.
    #[error("failed to read corpus file {}", path.display())]
    Read {
        /// Path that was opened
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Document is not valid JSON.
    #[error("corpus is not valid JSON")]
    Json(#[from] serde_json::Error),

    /// Top-level value is neither a channel-keyed object nor an array.
    #[error("corpus must be a channel-keyed object or a channel-indexed array, found {found}")]
    Structure {
        /// JSON type that was found instead
        found: &'static str,
    },

    /// A channel key is not a non-negative 32-bit integer.
    #[error("invalid channel id {key:?}")]
    InvalidChannel {
        /// Offending key
        key: String,
    },

    /// Two keys name the same channel (e.g. `"1"` and `"01"`).
    #[error("channel {channel} listed more than once")]
    DuplicateChannel {
        /// Repeated channel
        channel: ChannelId,
    },

    /// A channel's entry is not a list of frame records.
    #[error("channel {channel} must map to a list of frames, found {found}")]
    ChannelNotList {
        /// Channel whose entry is malformed
        channel: ChannelId,
        /// JSON type that was found instead
        found: &'static str,
    },

    /// A frame record is missing `timestamp`/`encoded` or has the wrong types.
    #[error("channel {channel} frame {index} is malformed")]
    Record {
        /// Channel the record is filed under
        channel: ChannelId,
        /// Position within the channel
        index: usize,
        /// Field-level parse error
        #[source]
        source: serde_json::Error,
    },

    /// A record's own `channel` field disagrees with where it is filed.
    #[error("channel {channel} frame {index} claims channel {claimed}")]
    ChannelMismatch {
        /// Channel the record is filed under
        channel: ChannelId,
        /// Position within the channel
        index: usize,
        /// Channel named by the record
        claimed: ChannelId,
    },
}

/// No frames were captured for a channel an attack referenced.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no frames captured for channel {channel}")]
pub struct ChannelNotFound {
    /// Requested channel
    pub channel: ChannelId,
}

/// A frame's payload could not be turned into raw bytes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    /// `encoded` is not a valid hex string.
    #[error("channel {channel} frame at timestamp {timestamp} has a non-hex payload")]
    MalformedPayload {
        /// Frame channel
        channel: ChannelId,
        /// Frame timestamp
        timestamp: u64,
        /// Hex decoder error
        #[source]
        source: hex::FromHexError,
    },
}

/// Transport-level failure talking to the decoder.
///
/// A decoder *rejecting* a frame is not an error; see
/// [`DecodeOutcome::Rejected`](crate::DecodeOutcome::Rejected).
#[derive(Error, Debug)]
pub enum DecodeError {
    /// No progress within the configured bound.
    #[error("{direction} timed out after {after:?}")]
    Timeout {
        /// Which half of the exchange stalled
        direction: Direction,
        /// Configured bound that elapsed
        after: Duration,
    },

    /// Decoder closed the connection.
    #[error("connection closed by decoder")]
    Closed,

    /// Underlying I/O error.
    #[error("transport I/O failed")]
    Io(#[from] io::Error),

    /// Decoder broke the exchange rules (wrong message at this step).
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Bytes on the wire do not form a valid message.
    #[error("wire format violation")]
    Wire(#[from] ProtocolError),

    /// An earlier exchange was abandoned mid-way; the stream position is
    /// unknown and no further reply can be attributed to a frame.
    #[error("connection out of sync after an abandoned exchange")]
    Desynchronized,
}

impl DecodeError {
    /// Returns true if the error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Fault raised while an attack was executing.
///
/// The runner reports these and moves on to the next attack.
#[derive(Error, Debug)]
pub enum AttackError {
    /// Attack referenced a channel absent from the corpus.
    #[error("channel lookup failed")]
    Channel(#[from] ChannelNotFound),

    /// A selected frame's payload is unusable.
    #[error("selected frame is unusable")]
    Frame(#[from] FrameError),

    /// Decode call failed at the transport level.
    #[error("decode call failed")]
    Decode(#[from] DecodeError),

    /// Corpus holds the channels but no frames satisfying the selection rule.
    #[error("no frames satisfy the selection rule: {reason}")]
    NoCandidate {
        /// What the attack was looking for
        reason: String,
    },

    /// Attack panicked; the runner caught the unwind.
    #[error("attack panicked: {message}")]
    Panicked {
        /// Panic payload, if it was a string
        message: String,
    },
}

impl AttackError {
    /// Returns true if the fault came from the decoder connection rather than
    /// from the corpus or the attack itself.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}
