//! Scripted decoder and attack doubles.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use replayprobe_core::{
    Attack, AttackContext, AttackError, ChannelId, DecodeError, DecodeOutcome, Decoder, Direction,
};

/// How a [`ScriptedDecoder`] answers every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderBehavior {
    /// Accept; plaintext is the submitted bytes.
    Echo,
    /// Refuse with this reason.
    Reject(String),
    /// Fail as if the read timed out.
    Timeout,
    /// Fail as if the device hung up.
    Closed,
}

/// In-memory decoder that records each submitted frame.
#[derive(Debug, Clone)]
pub struct ScriptedDecoder {
    behavior: DecoderBehavior,
    calls: Vec<Vec<u8>>,
}

impl ScriptedDecoder {
    /// Create a decoder with a fixed behavior.
    pub fn new(behavior: DecoderBehavior) -> Self {
        Self { behavior, calls: Vec::new() }
    }

    /// Decoder that accepts everything.
    pub fn echo() -> Self {
        Self::new(DecoderBehavior::Echo)
    }

    /// Decoder whose every call fails at the transport level.
    pub fn failing() -> Self {
        Self::new(DecoderBehavior::Timeout)
    }

    /// Submitted frames, in call order.
    pub fn calls(&self) -> &[Vec<u8>] {
        &self.calls
    }

    /// Number of decode calls.
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }
}

#[async_trait]
impl Decoder for ScriptedDecoder {
    async fn decode(&mut self, frame: &[u8]) -> Result<DecodeOutcome, DecodeError> {
        self.calls.push(frame.to_vec());
        match &self.behavior {
            DecoderBehavior::Echo => Ok(DecodeOutcome::Plaintext(Bytes::copy_from_slice(frame))),
            DecoderBehavior::Reject(reason) => {
                Ok(DecodeOutcome::Rejected { reason: reason.clone() })
            },
            DecoderBehavior::Timeout => Err(DecodeError::Timeout {
                direction: Direction::Read,
                after: Duration::from_secs(5),
            }),
            DecoderBehavior::Closed => Err(DecodeError::Closed),
        }
    }
}

/// What a [`ScriptedAttack`] does when executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackBehavior {
    /// Return `Ok` without touching the decoder.
    Succeed,
    /// Probe the first frame of a channel once.
    ProbeFirst(ChannelId),
    /// Return an error.
    Fail,
    /// Panic.
    Panic,
}

/// Attack double that counts its invocations.
///
/// Clones share the counter, so a test can keep one clone and register the
/// other.
#[derive(Debug, Clone)]
pub struct ScriptedAttack {
    name: &'static str,
    behavior: AttackBehavior,
    invocations: Arc<AtomicUsize>,
}

impl ScriptedAttack {
    /// Create an attack double.
    pub fn new(name: &'static str, behavior: AttackBehavior) -> Self {
        Self { name, behavior, invocations: Arc::new(AtomicUsize::new(0)) }
    }

    /// Times `execute` has been called.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Attack for ScriptedAttack {
    fn name(&self) -> &'static str {
        self.name
    }

    fn probes(&self) -> &'static str {
        "scripted behavior"
    }

    #[allow(clippy::panic)]
    async fn execute(&self, ctx: &mut AttackContext<'_>) -> Result<(), AttackError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            AttackBehavior::Succeed => Ok(()),
            AttackBehavior::ProbeFirst(channel) => {
                let frames = ctx.frames(channel)?;
                if let Some(frame) = frames.first() {
                    ctx.probe(frame).await?;
                }
                Ok(())
            },
            AttackBehavior::Fail => {
                Err(AttackError::NoCandidate { reason: format!("{} always fails", self.name) })
            },
            AttackBehavior::Panic => panic!("{} panicked on purpose", self.name),
        }
    }
}
