//! Attacks and the registry that orders them.
//!
//! An attack picks frames out of the corpus and submits them in an order the
//! decoder ought to refuse. It reports every outcome and returns; it never
//! judges the outcome itself.
//!
//! # Usage
//!
//! ```ignore
//! let registry = AttackRegistry::standard();
//! runner::run(&registry, &mut connection, &corpus, &mut reporter).await;
//! ```

mod replay;

use async_trait::async_trait;

pub use replay::{
    CrossChannelInterleave, EqualTimestampReplay, SameChannelReversal, select_interleave,
    select_reversal,
};

use crate::{
    corpus::Corpus,
    decoder::{DecodeOutcome, Decoder},
    error::{AttackError, ChannelNotFound},
    frame::{ChannelId, Frame},
    report::{Probe, Reporter},
};

/// Everything an attack may touch during one invocation.
///
/// The corpus is shared read-only. The decoder and reporter are borrowed
/// mutably for the duration of the attack, so no two attacks can interleave
/// calls on the connection.
pub struct AttackContext<'a> {
    attack: &'static str,
    decoder: &'a mut dyn Decoder,
    corpus: &'a Corpus,
    reporter: &'a mut dyn Reporter,
}

impl<'a> AttackContext<'a> {
    /// Create a context for the attack named `attack`.
    pub fn new(
        attack: &'static str,
        decoder: &'a mut dyn Decoder,
        corpus: &'a Corpus,
        reporter: &'a mut dyn Reporter,
    ) -> Self {
        Self { attack, decoder, corpus, reporter }
    }

    /// Name of the running attack.
    pub fn attack(&self) -> &'static str {
        self.attack
    }

    /// Corpus the run was started with.
    pub fn corpus(&self) -> &'a Corpus {
        self.corpus
    }

    /// Frames for `channel`, in capture order. Never empty.
    pub fn frames(&self, channel: ChannelId) -> Result<&'a [Frame], ChannelNotFound> {
        self.corpus.channel_frames(channel)
    }

    /// Submit `frame` to the decoder and report the outcome.
    ///
    /// The hex payload is decoded here, so a malformed frame fails only the
    /// attack that selected it.
    pub async fn probe(&mut self, frame: &Frame) -> Result<DecodeOutcome, AttackError> {
        let raw = frame.raw_bytes()?;
        tracing::debug!(
            channel = frame.channel(),
            timestamp = frame.timestamp(),
            bytes = raw.len(),
            "submitting frame"
        );

        let outcome = self.decoder.decode(&raw).await?;
        let probe =
            Probe { channel: frame.channel(), timestamp: frame.timestamp(), outcome };
        self.reporter.report_outcome(self.attack, &probe);
        Ok(probe.outcome)
    }
}

/// A named probe of one ordering invariant.
///
/// Implementations hold configuration only (which channels to use); nothing
/// carries over between invocations.
#[async_trait]
pub trait Attack: Send + Sync {
    /// Name used in every report line.
    fn name(&self) -> &'static str;

    /// The decoder property this attack exercises.
    fn probes(&self) -> &'static str;

    /// Run the attack once.
    async fn execute(&self, ctx: &mut AttackContext<'_>) -> Result<(), AttackError>;
}

/// Ordered list of attacks.
///
/// Registration order is execution order. Use [`AttackRegistry::standard()`]
/// for the three replay/ordering probes.
pub struct AttackRegistry {
    attacks: Vec<Box<dyn Attack>>,
}

impl Default for AttackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AttackRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { attacks: Vec::new() }
    }

    /// Create a registry with the standard replay probes.
    ///
    /// Includes, in order:
    /// - [`EqualTimestampReplay`]: same frame twice
    /// - [`CrossChannelInterleave`]: newer frame on one channel, then an older
    ///   frame on another
    /// - [`SameChannelReversal`]: two frames of one channel, newest first
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(EqualTimestampReplay::default());
        registry.add(CrossChannelInterleave::default());
        registry.add(SameChannelReversal::default());
        registry
    }

    /// Append an attack.
    pub fn add<A: Attack + 'static>(&mut self, attack: A) {
        self.attacks.push(Box::new(attack));
    }

    /// Attacks in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &(dyn Attack + 'static)> {
        self.attacks.iter().map(AsRef::as_ref)
    }

    /// Attack names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.attacks.iter().map(|attack| attack.name()).collect()
    }

    /// Number of registered attacks.
    pub fn len(&self) -> usize {
        self.attacks.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.attacks.is_empty()
    }
}
