use std::sync::Arc;

use crate::{
    constants::{MICROS_PER_SECOND, SENDER_REPORT_INTERVAL_SECS},
    modules::{client::Client, client_registry::ClientRegistry, rtp_clock::RtpClock},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
}

/// Broadcasts each completed frame to every ready client.
///
/// Delivery is best effort per client: a failing track is logged and skipped.
#[derive(Debug)]
pub struct FrameDispatcher {
    clock: RtpClock,
    ready_clients: Vec<Arc<Client>>,
}

impl FrameDispatcher {
    pub fn new(clock: RtpClock) -> Self {
        Self {
            clock,
            ready_clients: Vec::new(),
        }
    }

    pub fn clock(&self) -> RtpClock {
        self.clock
    }

    /// Sends `frame` to every ready client.
    ///
    /// Timestamps accumulate: each client's timestamp moves forward from its
    /// previous value by `frame_duration_us` worth of ticks, rather than being
    /// recomputed as start timestamp plus elapsed time. This keeps live frames
    /// continuous with the two bootstrap frames sent at `start - 2d` and
    /// `start - d`.
    pub fn dispatch(
        &mut self,
        registry: &ClientRegistry,
        frame: &[u8],
        frame_duration_us: u64,
    ) -> DispatchSummary {
        registry.collect_ready(&mut self.ready_clients);

        let elapsed_seconds = frame_duration_us as f64 / MICROS_PER_SECOND;
        let elapsed_timestamp = self.clock.seconds_to_timestamp(elapsed_seconds);

        let mut summary = DispatchSummary::default();
        for client in self.ready_clients.drain(..) {
            let timestamp = client.with_timing(|timing| timing.advance(elapsed_timestamp));

            let track = client.track();
            let report_elapsed = timestamp.wrapping_sub(track.last_reported_timestamp());
            if self.clock.timestamp_to_seconds(report_elapsed) > SENDER_REPORT_INTERVAL_SECS {
                track.set_needs_report();
            }

            match track.send(frame, timestamp) {
                Ok(()) => summary.delivered += 1,
                Err(err) => {
                    tracing::warn!(client_id = %client.id(), "Failed to send frame: {:?}", err);
                    summary.failed += 1;
                }
            }
        }

        tracing::trace!(
            "Dispatched {} bytes to {} clients ({} failed).",
            frame.len(),
            summary.delivered,
            summary.failed
        );

        summary
    }
}
