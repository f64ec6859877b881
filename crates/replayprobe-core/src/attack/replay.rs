//! Replay and reordering probes.
//!
//! Each attack replays captured frames outside their capture order. Channel
//! defaults follow the usual capture layout: channel 0 carries the
//! always-available broadcast and channel 1 is the first subscription
//! channel.

use async_trait::async_trait;

use super::{Attack, AttackContext};
use crate::{
    error::AttackError,
    frame::{ChannelId, Frame},
};

/// Submit the same frame twice in a row.
///
/// A decoder that treats an exact timestamp repeat as a replay rejects the
/// second call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EqualTimestampReplay {
    /// Channel whose first frame is replayed
    pub channel: ChannelId,
}

impl Default for EqualTimestampReplay {
    fn default() -> Self {
        Self { channel: 1 }
    }
}

#[async_trait]
impl Attack for EqualTimestampReplay {
    fn name(&self) -> &'static str {
        "equal-timestamp-replay"
    }

    fn probes(&self) -> &'static str {
        "an exact timestamp repeat is treated as a replay"
    }

    async fn execute(&self, ctx: &mut AttackContext<'_>) -> Result<(), AttackError> {
        let frame = &ctx.frames(self.channel)?[0];

        ctx.probe(frame).await?;
        ctx.probe(frame).await?;
        Ok(())
    }
}

/// Submit a newer frame from one channel, then an older frame from another.
///
/// Timestamp state must be tracked per channel; a decoder that tracks a
/// single global high-water mark rejects the second call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossChannelInterleave {
    /// Channel supplying the newer frame, submitted first
    pub later_channel: ChannelId,
    /// Channel supplying the older frame, submitted second
    pub earlier_channel: ChannelId,
}

impl Default for CrossChannelInterleave {
    fn default() -> Self {
        Self { later_channel: 0, earlier_channel: 1 }
    }
}

#[async_trait]
impl Attack for CrossChannelInterleave {
    fn name(&self) -> &'static str {
        "cross-channel-interleave"
    }

    fn probes(&self) -> &'static str {
        "a newer frame on one channel does not affect acceptance on another"
    }

    async fn execute(&self, ctx: &mut AttackContext<'_>) -> Result<(), AttackError> {
        let later = ctx.frames(self.later_channel)?;
        let earlier = ctx.frames(self.earlier_channel)?;

        let (newer, older) =
            select_interleave(later, earlier).ok_or_else(|| AttackError::NoCandidate {
                reason: format!(
                    "no frame on channel {} is newer than any frame on channel {}",
                    self.later_channel, self.earlier_channel
                ),
            })?;

        ctx.probe(newer).await?;
        ctx.probe(older).await?;
        Ok(())
    }
}

/// Submit two frames of one channel in reverse capture order.
///
/// A decoder enforcing strictly increasing timestamps within a channel
/// rejects the second (older) frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SameChannelReversal {
    /// Channel supplying both frames
    pub channel: ChannelId,
}

impl Default for SameChannelReversal {
    fn default() -> Self {
        Self { channel: 0 }
    }
}

#[async_trait]
impl Attack for SameChannelReversal {
    fn name(&self) -> &'static str {
        "same-channel-reversal"
    }

    fn probes(&self) -> &'static str {
        "timestamps within a channel must strictly increase"
    }

    async fn execute(&self, ctx: &mut AttackContext<'_>) -> Result<(), AttackError> {
        let frames = ctx.frames(self.channel)?;
        let (older, newer) = select_reversal(frames).ok_or_else(|| AttackError::NoCandidate {
            reason: format!(
                "channel {} has no two consecutive frames with increasing timestamps",
                self.channel
            ),
        })?;

        ctx.probe(newer).await?;
        ctx.probe(older).await?;
        Ok(())
    }
}

/// Pick `(newer, older)` for [`CrossChannelInterleave`].
///
/// Walks `earlier` in capture order and stops at the first frame that some
/// frame in `later` strictly exceeds. The newer frame is the one in `later`
/// with the greatest timestamp, earliest in capture order on ties.
pub fn select_interleave<'c>(
    later: &'c [Frame],
    earlier: &'c [Frame],
) -> Option<(&'c Frame, &'c Frame)> {
    let newest = latest(later)?;
    let older = earlier.iter().find(|frame| frame.timestamp() < newest.timestamp())?;
    Some((newest, older))
}

/// Pick `(older, newer)` for [`SameChannelReversal`].
///
/// Returns the first adjacent pair in capture order whose timestamps strictly
/// increase.
pub fn select_reversal(frames: &[Frame]) -> Option<(&Frame, &Frame)> {
    frames
        .windows(2)
        .find(|pair| pair[0].timestamp() < pair[1].timestamp())
        .map(|pair| (&pair[0], &pair[1]))
}

fn latest(frames: &[Frame]) -> Option<&Frame> {
    frames.iter().fold(None, |best: Option<&Frame>, frame| match best {
        Some(best) if best.timestamp() >= frame.timestamp() => Some(best),
        _ => Some(frame),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(channel: ChannelId, timestamps: &[u64]) -> Vec<Frame> {
        timestamps.iter().map(|&ts| Frame::from_raw(channel, ts, ts.to_le_bytes())).collect()
    }

    #[test]
    fn interleave_picks_latest_newer_frame() {
        let later = frames(0, &[100, 200]);
        let earlier = frames(1, &[50]);

        let (newer, older) = select_interleave(&later, &earlier).expect("candidate exists");
        assert_eq!((newer.timestamp(), older.timestamp()), (200, 50));
    }

    #[test]
    fn interleave_skips_earlier_frames_that_are_not_exceeded() {
        let later = frames(0, &[100]);
        let earlier = frames(1, &[150, 90, 40]);

        let (newer, older) = select_interleave(&later, &earlier).expect("candidate exists");
        assert_eq!((newer.timestamp(), older.timestamp()), (100, 90));
    }

    #[test]
    fn interleave_tie_prefers_first_captured() {
        let later = vec![Frame::new(0, 300, "01"), Frame::new(0, 300, "02")];
        let earlier = frames(1, &[10]);

        let (newer, _) = select_interleave(&later, &earlier).expect("candidate exists");
        assert_eq!(newer.encoded(), "01");
    }

    #[test]
    fn interleave_without_strictly_newer_frame() {
        let later = frames(0, &[50]);
        let earlier = frames(1, &[50, 60]);
        assert!(select_interleave(&later, &earlier).is_none());
    }

    #[test]
    fn reversal_uses_first_increasing_pair() {
        let channel = frames(0, &[10, 10, 30, 40]);
        let (older, newer) = select_reversal(&channel).expect("pair exists");
        assert_eq!((older.timestamp(), newer.timestamp()), (10, 30));
    }

    #[test]
    fn reversal_needs_two_frames() {
        assert!(select_reversal(&frames(0, &[10])).is_none());
        assert!(select_reversal(&frames(0, &[30, 20, 10])).is_none());
    }
}
