//! Attack orchestration for probing a broadcast decoder's anti-replay rules.
//!
//! A [`Corpus`] of captured frames is loaded once and handed, together with a
//! single [`Decoder`] connection, to every [`Attack`] in an
//! [`AttackRegistry`]. The [`runner`] executes attacks one at a time and
//! funnels every decode outcome and every fault to a [`Reporter`].
//!
//! Attacks characterize the decoder; they never decide pass/fail. Whether a
//! replayed frame *should* have been rejected is left to whoever reads the
//! report.

#![forbid(unsafe_code)]

pub mod attack;
pub mod corpus;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod report;
pub mod runner;

pub use attack::{
    Attack, AttackContext, AttackRegistry, CrossChannelInterleave, EqualTimestampReplay,
    SameChannelReversal,
};
pub use corpus::Corpus;
pub use decoder::{DecodeOutcome, Decoder, Direction};
pub use error::{AttackError, ChannelNotFound, CorpusLoadError, DecodeError, FrameError};
pub use frame::{ChannelId, Frame};
pub use report::{Probe, Reporter, TracingReporter};
pub use runner::{load_and_run, run};
