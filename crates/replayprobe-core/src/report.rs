//! Outcome reporting.
//!
//! Output is append-only and ordered by invocation. Nothing is aggregated;
//! each attack's lines stand on their own.

use std::error::Error;

use crate::{decoder::DecodeOutcome, error::AttackError, frame::ChannelId};

/// Marker that opens a CTF flag inside decoded plaintext.
pub const FLAG_PREFIX: &str = "ectf{";

/// One decode call made by an attack, and what came back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    /// Channel of the submitted frame
    pub channel: ChannelId,
    /// Timestamp of the submitted frame
    pub timestamp: u64,
    /// Decoder's answer
    pub outcome: DecodeOutcome,
}

/// Sink for attack progress, outcomes and faults.
pub trait Reporter: Send {
    /// An attack is about to run.
    fn report_start(&mut self, attack: &str);

    /// An attack completed one decode call.
    fn report_outcome(&mut self, attack: &str, probe: &Probe);

    /// An attack stopped with a fault. Called at most once per attack run.
    fn report_fault(&mut self, attack: &str, fault: &AttackError);
}

/// Reporter that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl TracingReporter {
    /// Create a new tracing reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for TracingReporter {
    fn report_start(&mut self, attack: &str) {
        tracing::info!("Running {attack}");
    }

    fn report_outcome(&mut self, attack: &str, probe: &Probe) {
        match &probe.outcome {
            DecodeOutcome::Plaintext(plaintext) => {
                tracing::info!(
                    attack,
                    channel = probe.channel,
                    timestamp = probe.timestamp,
                    plaintext = %String::from_utf8_lossy(plaintext),
                    hex = %hex::encode(plaintext),
                    "decoder accepted frame"
                );
                for flag in find_flags(plaintext) {
                    tracing::warn!(
                        attack,
                        channel = probe.channel,
                        timestamp = probe.timestamp,
                        flag = %flag,
                        "POTENTIAL VULNERABILITY: decoder released a flag"
                    );
                }
            },
            DecodeOutcome::Rejected { reason } => {
                tracing::info!(
                    attack,
                    channel = probe.channel,
                    timestamp = probe.timestamp,
                    reason = %reason,
                    "decoder rejected frame"
                );
            },
        }
    }

    fn report_fault(&mut self, attack: &str, fault: &AttackError) {
        tracing::error!(
            attack,
            transport = fault.is_transport(),
            fault = %render_chain(fault),
            "attack faulted"
        );
    }
}

/// Display strings of `err` and every `source()` below it, outermost first.
pub fn error_chain(err: &(dyn Error + 'static)) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}

/// Single-line rendering of an error and its causes.
pub fn render_chain(err: &(dyn Error + 'static)) -> String {
    error_chain(err).join(": ")
}

/// Every `ectf{...}` flag appearing in a plaintext.
///
/// A flag body holds at least one character and never spans a line break.
pub fn find_flags(plaintext: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(plaintext);
    let mut flags = Vec::new();
    let mut rest = text.as_ref();

    while let Some(start) = rest.find(FLAG_PREFIX) {
        let candidate = &rest[start..];
        let body = &candidate[FLAG_PREFIX.len()..];
        let Some(first) = body.chars().next() else {
            break;
        };
        let stop = body[first.len_utf8()..].find(['}', '\n']).map(|i| i + first.len_utf8());
        match stop {
            Some(end) if first != '\n' && body.as_bytes()[end] == b'}' => {
                let flag_len = FLAG_PREFIX.len() + end + 1;
                flags.push(candidate[..flag_len].to_string());
                rest = &candidate[flag_len..];
            },
            Some(_) => rest = body,
            None => break,
        }
    }
    flags
}
