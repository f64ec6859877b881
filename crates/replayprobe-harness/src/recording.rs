//! In-memory reporter.

use replayprobe_core::{AttackError, Probe, Reporter, report::render_chain};

/// One reporter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    /// `report_start`
    Started {
        /// Attack name
        attack: String,
    },
    /// `report_outcome`
    Outcome {
        /// Attack name
        attack: String,
        /// Decode call and result
        probe: Probe,
    },
    /// `report_fault`
    Fault {
        /// Attack name
        attack: String,
        /// Fault rendered with its full cause chain
        chain: String,
        /// Whether the fault came from the decoder connection
        transport: bool,
    },
}

/// Reporter that records every event in call order.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    events: Vec<ReportEvent>,
}

impl RecordingReporter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in call order.
    pub fn events(&self) -> &[ReportEvent] {
        &self.events
    }

    /// Names passed to `report_start`, in order.
    pub fn started(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ReportEvent::Started { attack } => Some(attack.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Probes reported by `attack`, in order.
    pub fn probes(&self, attack: &str) -> Vec<&Probe> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ReportEvent::Outcome { attack: name, probe } if name == attack => Some(probe),
                _ => None,
            })
            .collect()
    }

    /// `(attack, chain)` for every fault, in order.
    pub fn faults(&self) -> Vec<(&str, &str)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ReportEvent::Fault { attack, chain, .. } => Some((attack.as_str(), chain.as_str())),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report_start(&mut self, attack: &str) {
        self.events.push(ReportEvent::Started { attack: attack.to_string() });
    }

    fn report_outcome(&mut self, attack: &str, probe: &Probe) {
        self.events.push(ReportEvent::Outcome { attack: attack.to_string(), probe: probe.clone() });
    }

    fn report_fault(&mut self, attack: &str, fault: &AttackError) {
        self.events.push(ReportEvent::Fault {
            attack: attack.to_string(),
            chain: render_chain(fault),
            transport: fault.is_transport(),
        });
    }
}
