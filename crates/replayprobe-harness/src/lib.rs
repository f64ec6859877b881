//! Test harness for replayprobe.
//!
//! Doubles for every seam the runner touches, plus a protocol-speaking
//! decoder model:
//!
//! - [`ScriptedDecoder`]: in-memory [`Decoder`](replayprobe_core::Decoder)
//!   that records every submitted frame and answers per a fixed behavior.
//! - [`ScriptedAttack`]: attack that counts invocations and succeeds, fails
//!   or panics on demand.
//! - [`RecordingReporter`]: keeps every report event in order.
//! - [`CorpusBuilder`]: builds corpora of frames packed in the device's frame
//!   layout, in memory or as JSON on disk.
//! - [`SimDevice`]: decoder model with a selectable [`ReplayPolicy`] that
//!   speaks the wire protocol over any async byte stream.

#![forbid(unsafe_code)]

pub mod corpus;
pub mod recording;
pub mod scripted;
pub mod sim_device;

pub use corpus::{CorpusBuilder, FRAME_HEADER_SIZE, pack_frame, unpack_frame};
pub use recording::{RecordingReporter, ReportEvent};
pub use scripted::{AttackBehavior, DecoderBehavior, ScriptedAttack, ScriptedDecoder};
pub use sim_device::{ReplayPolicy, SimDevice};
