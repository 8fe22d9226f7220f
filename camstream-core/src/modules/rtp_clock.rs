use crate::constants::{DEFAULT_VIDEO_CLOCK_RATE, MICROS_PER_SECOND};

/// Converts between wall time and RTP timestamp ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpClock {
    clock_rate: u32,
}

impl Default for RtpClock {
    fn default() -> Self {
        Self::new(DEFAULT_VIDEO_CLOCK_RATE)
    }
}

impl RtpClock {
    pub fn new(clock_rate: u32) -> Self {
        Self { clock_rate }
    }

    pub fn clock_rate(&self) -> u32 {
        self.clock_rate
    }

    /// Truncates towards zero; negative durations map to zero ticks.
    pub fn seconds_to_timestamp(&self, seconds: f64) -> u32 {
        (seconds * self.clock_rate as f64) as u32
    }

    pub fn timestamp_to_seconds(&self, timestamp: u32) -> f64 {
        timestamp as f64 / self.clock_rate as f64
    }

    pub fn micros_to_timestamp(&self, micros: u64) -> u32 {
        self.seconds_to_timestamp(micros as f64 / MICROS_PER_SECOND)
    }
}

/// RTP timing state of one outbound video track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpTiming {
    pub start_timestamp: u32,
    pub timestamp: u32,
}

impl RtpTiming {
    pub fn new(start_timestamp: u32) -> Self {
        Self {
            start_timestamp,
            timestamp: start_timestamp,
        }
    }

    /// Moves the timestamp forward by `ticks`, wrapping at 2^32.
    pub fn advance(&mut self, ticks: u32) -> u32 {
        self.timestamp = self.timestamp.wrapping_add(ticks);
        self.timestamp
    }

    /// Places the timestamp `ticks` before the stream start.
    pub fn rewind_before_start(&mut self, ticks: u32) -> u32 {
        self.timestamp = self.start_timestamp.wrapping_sub(ticks);
        self.timestamp
    }
}
