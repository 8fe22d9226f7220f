use anyhow::{Context, Result};

use crate::modules::{client::Client, keyframe_cache::KeyframeCache, rtp_clock::RtpClock};

/// Sends the cached keyframe to a viewer whose track just opened.
///
/// The same SPS, PPS and IDR run goes out twice, two and one frame durations
/// before the client's start timestamp, so the decoder can render before the
/// next live keyframe arrives.
#[derive(Debug, Clone, Copy, Default)]
pub struct LateJoinBootstrapper {
    clock: RtpClock,
}

impl LateJoinBootstrapper {
    pub fn new(clock: RtpClock) -> Self {
        Self { clock }
    }

    /// Returns `false` when no keyframe has been cached yet.
    pub fn bootstrap(
        &self,
        client: &Client,
        cache: &KeyframeCache,
        frame_duration_us: u64,
    ) -> Result<bool> {
        let sequence = cache.bootstrap_sequence();
        if sequence.is_empty() {
            tracing::debug!(client_id = %client.id(), "No keyframe cached yet, skip bootstrap.");
            return Ok(false);
        }

        let frame_timestamp_duration = self.clock.micros_to_timestamp(frame_duration_us);

        let timestamp = client.with_timing(|timing| {
            timing.rewind_before_start(frame_timestamp_duration.wrapping_mul(2))
        });
        client
            .track()
            .send(&sequence, timestamp)
            .context("first bootstrap frame")?;

        let timestamp = client.with_timing(|timing| timing.advance(frame_timestamp_duration));
        client
            .track()
            .send(&sequence, timestamp)
            .context("second bootstrap frame")?;

        tracing::debug!(
            client_id = %client.id(),
            "Sent {} bytes of cached keyframe twice.",
            sequence.len()
        );

        Ok(true)
    }
}
