//! The capability every attack drives: submit a frame, observe the result.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::DecodeError;

/// What the decoder did with a submitted frame.
///
/// Both variants are *successful* probes. Rejection is the answer a hardened
/// decoder gives to a replayed frame, and is kept apart from
/// [`DecodeError`], which means the conversation itself broke down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Frame accepted; decoded plaintext.
    Plaintext(Bytes),
    /// Frame refused by the decoder.
    Rejected {
        /// Reason text sent by the decoder (may be empty)
        reason: String,
    },
}

impl DecodeOutcome {
    /// Returns true if the decoder refused the frame.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Plaintext if the frame was accepted.
    pub fn plaintext(&self) -> Option<&[u8]> {
        match self {
            Self::Plaintext(bytes) => Some(bytes),
            Self::Rejected { .. } => None,
        }
    }
}

/// Half of the exchange a timeout applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Waiting for bytes from the decoder.
    Read,
    /// Waiting for the decoder to accept bytes.
    Write,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// Connection to a device under test.
///
/// One call is in flight at a time; callers hold `&mut`. Implementations must
/// bound every call with their configured timeouts so that a silent device
/// yields [`DecodeError::Timeout`] instead of hanging the run.
#[async_trait]
pub trait Decoder: Send {
    /// Submit raw frame bytes.
    async fn decode(&mut self, frame: &[u8]) -> Result<DecodeOutcome, DecodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_accessor_matches_variant() {
        let accepted = DecodeOutcome::Plaintext(Bytes::from_static(b"hi"));
        let rejected = DecodeOutcome::Rejected { reason: "stale".to_string() };

        assert_eq!(accepted.plaintext(), Some(&b"hi"[..]));
        assert!(!accepted.is_rejected());
        assert_eq!(rejected.plaintext(), None);
        assert!(rejected.is_rejected());
    }
}
