//! Sequential attack execution with fault isolation.
//!
//! Attacks run one at a time, in registration order, on the calling task.
//! Parallelism is deliberately absent: attacks share one connection and the
//! decoder's replay-detection state, and the order in which they touch that
//! state is part of what is being probed.

use std::{any::Any, panic::AssertUnwindSafe, path::Path};

use futures::FutureExt;
use tracing::Instrument;

use crate::{
    attack::{AttackContext, AttackRegistry},
    corpus::Corpus,
    decoder::Decoder,
    error::{AttackError, CorpusLoadError},
    report::Reporter,
};

/// Run every registered attack once.
///
/// A fault in one attack (an error it returns, or a panic) is reported and
/// the run moves on. Faults are never retried.
pub async fn run(
    registry: &AttackRegistry,
    decoder: &mut dyn Decoder,
    corpus: &Corpus,
    reporter: &mut dyn Reporter,
) {
    for attack in registry.iter() {
        let name = attack.name();
        reporter.report_start(name);

        let span = tracing::info_span!("attack", name);
        let result = {
            let mut ctx = AttackContext::new(name, &mut *decoder, corpus, &mut *reporter);
            tracing::debug!(parent: &span, probes = attack.probes(), "starting");
            AssertUnwindSafe(attack.execute(&mut ctx)).catch_unwind().instrument(span).await
        };

        let fault = match result {
            Ok(Ok(())) => None,
            Ok(Err(fault)) => Some(fault),
            Err(payload) => {
                Some(AttackError::Panicked { message: panic_message(payload.as_ref()) })
            },
        };

        if let Some(fault) = fault {
            reporter.report_fault(name, &fault);
        }
    }
}

/// Load the corpus at `path`, then [`run`] the registry against it.
///
/// # Errors
///
/// - `CorpusLoadError` if the corpus cannot be loaded. No attack is invoked
///   and the decoder is never called.
pub async fn load_and_run(
    path: impl AsRef<Path>,
    registry: &AttackRegistry,
    decoder: &mut dyn Decoder,
    reporter: &mut dyn Reporter,
) -> Result<Corpus, CorpusLoadError> {
    let corpus = Corpus::load(path)?;
    run(registry, decoder, &corpus, reporter).await;
    Ok(corpus)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::{
        attack::Attack,
        decoder::DecodeOutcome,
        error::DecodeError,
        frame::Frame,
        report::Probe,
    };

    struct Echo {
        calls: usize,
    }

    #[async_trait]
    impl Decoder for Echo {
        async fn decode(&mut self, frame: &[u8]) -> Result<DecodeOutcome, DecodeError> {
            self.calls += 1;
            Ok(DecodeOutcome::Plaintext(Bytes::copy_from_slice(frame)))
        }
    }

    #[derive(Default)]
    struct Log {
        lines: Vec<String>,
    }

    impl Reporter for Log {
        fn report_start(&mut self, attack: &str) {
            self.lines.push(format!("start {attack}"));
        }

        fn report_outcome(&mut self, attack: &str, probe: &Probe) {
            self.lines.push(format!("outcome {attack} {}", probe.timestamp));
        }

        fn report_fault(&mut self, attack: &str, fault: &AttackError) {
            self.lines.push(format!("fault {attack} {fault}"));
        }
    }

    struct Panics;

    #[async_trait]
    impl Attack for Panics {
        fn name(&self) -> &'static str {
            "panics"
        }

        fn probes(&self) -> &'static str {
            "nothing"
        }

        #[allow(clippy::panic)]
        async fn execute(&self, _ctx: &mut AttackContext<'_>) -> Result<(), AttackError> {
            panic!("selection bug");
        }
    }

    fn corpus() -> Corpus {
        Corpus::from_frames([
            Frame::from_raw(0, 100, b"f0"),
            Frame::from_raw(0, 200, b"f1"),
            Frame::from_raw(1, 50, b"g0"),
        ])
    }

    #[tokio::test]
    async fn panic_is_contained_and_run_continues() {
        let mut registry = AttackRegistry::new();
        registry.add(Panics);
        registry.add(crate::SameChannelReversal::default());

        let mut decoder = Echo { calls: 0 };
        let mut log = Log::default();
        run(&registry, &mut decoder, &corpus(), &mut log).await;

        assert_eq!(
            log.lines,
            vec![
                "start panics",
                "fault panics attack panicked: selection bug",
                "start same-channel-reversal",
                "outcome same-channel-reversal 200",
                "outcome same-channel-reversal 100",
            ]
        );
        assert_eq!(decoder.calls, 2);
    }

    #[tokio::test]
    async fn missing_channel_faults_only_that_attack() {
        let mut registry = AttackRegistry::new();
        registry.add(crate::EqualTimestampReplay { channel: 9 });
        registry.add(crate::EqualTimestampReplay { channel: 1 });

        let mut decoder = Echo { calls: 0 };
        let mut log = Log::default();
        run(&registry, &mut decoder, &corpus(), &mut log).await;

        assert_eq!(log.lines[1], "fault equal-timestamp-replay channel lookup failed");
        assert_eq!(
            log.lines[2..],
            [
                "start equal-timestamp-replay",
                "outcome equal-timestamp-replay 50",
                "outcome equal-timestamp-replay 50",
            ]
        );
        assert_eq!(decoder.calls, 2);
    }
}
