// Annex-B
pub const NALU_SHORT_START_SEQUENCE_SIZE: usize = 3;
pub const NALU_TYPE_MASK: u8 = 0x1F;

// length prefix written in front of every reassembled unit
pub const LENGTH_PREFIX_SIZE: usize = 4;

pub const DEFAULT_FRAME_BUFFER_CAPACITY: usize = 1024 * 1024;

// RTP
pub const DEFAULT_VIDEO_CLOCK_RATE: u32 = 90_000;
pub const SENDER_REPORT_INTERVAL_SECS: f64 = 1.0;
pub const MICROS_PER_SECOND: f64 = 1_000_000.0;

// servo pulse widths in microseconds
pub const PULSE_WIDTH_MIN: u16 = 1000;
pub const PULSE_WIDTH_MAX: u16 = 2000;
pub const PULSE_WIDTH_NEUTRAL: u16 = 1500;
