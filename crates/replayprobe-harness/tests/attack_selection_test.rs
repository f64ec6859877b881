//! Which frames each standard attack submits, and in what order.
//!
//! The scenario corpus is channel 0 = [F0 @ 100, F1 @ 200] and
//! channel 1 = [G0 @ 50].

use replayprobe_core::{
    AttackRegistry, Corpus, CrossChannelInterleave, EqualTimestampReplay, SameChannelReversal, run,
};
use replayprobe_harness::{
    CorpusBuilder, DecoderBehavior, RecordingReporter, ScriptedDecoder, unpack_frame,
};

fn scenario() -> CorpusBuilder {
    CorpusBuilder::new().frame(0, 100, b"F0").frame(0, 200, b"F1").frame(1, 50, b"G0")
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(future)
}

/// Run `registry` against an accepting decoder; returns (decoder, reporter).
fn run_echo(registry: &AttackRegistry, corpus: &Corpus) -> (ScriptedDecoder, RecordingReporter) {
    let mut decoder = ScriptedDecoder::echo();
    let mut reporter = RecordingReporter::new();
    block_on(run(registry, &mut decoder, corpus, &mut reporter));
    (decoder, reporter)
}

/// `(channel, timestamp, payload)` of every decode call.
fn submitted(decoder: &ScriptedDecoder) -> Vec<(u32, u64, Vec<u8>)> {
    decoder
        .calls()
        .iter()
        .map(|raw| {
            let (channel, timestamp, payload) = unpack_frame(raw).expect("packed frame");
            (channel, timestamp, payload.to_vec())
        })
        .collect()
}

fn single(attack: impl replayprobe_core::Attack + 'static) -> AttackRegistry {
    let mut registry = AttackRegistry::new();
    registry.add(attack);
    registry
}

#[test]
fn equal_timestamp_replay_submits_identical_frames() {
    let registry = single(EqualTimestampReplay::default());
    let (decoder, reporter) = run_echo(&registry, &scenario().build());

    assert_eq!(decoder.call_count(), 2);
    assert_eq!(decoder.calls()[0], decoder.calls()[1]);
    assert_eq!(submitted(&decoder)[0], (1, 50, b"G0".to_vec()));

    let probes = reporter.probes("equal-timestamp-replay");
    assert_eq!(probes.len(), 2);
    assert_eq!(probes[0].timestamp, probes[1].timestamp);
}

#[test]
fn reversal_submits_strictly_descending_timestamps() {
    let (decoder, _) = run_echo(&single(SameChannelReversal::default()), &scenario().build());

    let calls = submitted(&decoder);
    assert_eq!(calls, vec![(0, 200, b"F1".to_vec()), (0, 100, b"F0".to_vec())]);
}

#[test]
fn interleave_submits_newer_then_older_channel() {
    let (decoder, _) = run_echo(&single(CrossChannelInterleave::default()), &scenario().build());

    let calls = submitted(&decoder);
    assert_eq!(calls, vec![(0, 200, b"F1".to_vec()), (1, 50, b"G0".to_vec())]);
}

#[test]
fn standard_registry_call_order() {
    let (decoder, reporter) = run_echo(&AttackRegistry::standard(), &scenario().build());

    let order: Vec<(u32, u64)> = submitted(&decoder)
        .into_iter()
        .map(|(channel, timestamp, _)| (channel, timestamp))
        .collect();
    assert_eq!(order, vec![(1, 50), (1, 50), (0, 200), (1, 50), (0, 200), (0, 100)]);
    assert!(reporter.faults().is_empty());
}

#[test]
fn rejections_are_outcomes_not_faults() {
    let mut decoder = ScriptedDecoder::new(DecoderBehavior::Reject("replay".to_string()));
    let mut reporter = RecordingReporter::new();
    block_on(run(&AttackRegistry::standard(), &mut decoder, &scenario().build(), &mut reporter));

    assert!(reporter.faults().is_empty());
    let probes = reporter.probes("same-channel-reversal");
    assert_eq!(probes.len(), 2);
    assert!(probes.iter().all(|probe| probe.outcome.is_rejected()));
}

#[test]
fn missing_channel_faults_only_attacks_that_need_it() {
    let corpus = CorpusBuilder::new().frame(0, 100, b"F0").frame(0, 200, b"F1").build();
    let (decoder, reporter) = run_echo(&AttackRegistry::standard(), &corpus);

    assert_eq!(
        reporter.faults(),
        vec![
            ("equal-timestamp-replay", "channel lookup failed: no frames captured for channel 1"),
            ("cross-channel-interleave", "channel lookup failed: no frames captured for channel 1"),
        ]
    );
    assert_eq!(reporter.probes("same-channel-reversal").len(), 2);
    assert_eq!(decoder.call_count(), 2);
}

#[test]
fn malformed_payload_faults_only_its_attack() {
    let corpus = CorpusBuilder::new()
        .frame(0, 100, b"F0")
        .frame(0, 200, b"F1")
        .encoded(1, 50, "not hex")
        .build();
    let (decoder, reporter) = run_echo(&AttackRegistry::standard(), &corpus);

    let faulted: Vec<&str> = reporter.faults().iter().map(|(attack, _)| *attack).collect();
    assert_eq!(faulted, vec!["equal-timestamp-replay", "cross-channel-interleave"]);
    for (_, chain) in reporter.faults() {
        assert!(chain.starts_with("selected frame is unusable"), "{chain}");
    }

    // Interleave got its first call in before the bad frame; reversal is untouched.
    assert_eq!(reporter.probes("cross-channel-interleave").len(), 1);
    assert_eq!(reporter.probes("same-channel-reversal").len(), 2);
    assert_eq!(decoder.call_count(), 3);
}

#[test]
fn interleave_without_older_frame_has_no_candidate() {
    let attack = CrossChannelInterleave { later_channel: 1, earlier_channel: 0 };
    let (decoder, reporter) = run_echo(&single(attack), &scenario().build());

    let faults = reporter.faults();
    assert_eq!(faults.len(), 1);
    assert!(faults[0].1.contains("no frame on channel 1 is newer"), "{}", faults[0].1);
    assert_eq!(decoder.call_count(), 0);
}

#[test]
fn reversal_on_single_frame_channel_has_no_candidate() {
    let attack = SameChannelReversal { channel: 1 };
    let (decoder, reporter) = run_echo(&single(attack), &scenario().build());

    assert_eq!(reporter.faults().len(), 1);
    assert_eq!(decoder.call_count(), 0);
}
