use std::ops::Range;

use num_enum::{FromPrimitive, IntoPrimitive};

use crate::constants::{NALU_SHORT_START_SEQUENCE_SIZE, NALU_TYPE_MASK};

/// Position of one NAL unit inside an Annex-B buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NaluIndex {
    /// Start of the unit, including the 3 or 4 byte start sequence.
    pub start_offset: usize,
    /// Start of the payload, which begins with the NAL header byte.
    pub payload_start_offset: usize,
    /// Payload length counted from `payload_start_offset`.
    pub payload_size: usize,
}

impl NaluIndex {
    pub fn payload_range(&self) -> Range<usize> {
        self.payload_start_offset..self.payload_start_offset + self.payload_size
    }

    pub fn start_sequence_size(&self) -> usize {
        self.payload_start_offset - self.start_offset
    }
}

/// H.264 `nal_unit_type`, the low five bits of the NAL header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum NaluType {
    Slice = 1,
    SliceDataPartitionA = 2,
    SliceDataPartitionB = 3,
    SliceDataPartitionC = 4,
    Idr = 5,
    Sei = 6,
    Sps = 7,
    Pps = 8,
    AccessUnitDelimiter = 9,
    EndOfSequence = 10,
    EndOfStream = 11,
    Filler = 12,
    #[num_enum(catch_all)]
    Other(u8),
}

impl NaluType {
    pub fn from_header(header: u8) -> Self {
        NaluType::from(header & NALU_TYPE_MASK)
    }

    pub fn is_parameter_set(&self) -> bool {
        matches!(self, NaluType::Sps | NaluType::Pps)
    }

    pub fn is_slice(&self) -> bool {
        matches!(self, NaluType::Slice | NaluType::Idr)
    }
}

/// Reusable start code scanner.
///
/// The index list is cleared and refilled on every [`NaluScanner::scan`], so a
/// scanner kept alive across encoder callbacks stops allocating once its
/// scratch vector has grown to the largest unit count seen.
#[derive(Debug, Default)]
pub struct NaluScanner {
    indices: Vec<NaluIndex>,
}

impl NaluScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            indices: Vec::with_capacity(capacity),
        }
    }

    /// Finds every start sequence in `buffer` in a single forward pass.
    ///
    /// When the third byte of the current window is neither 0 nor 1, no start
    /// sequence can begin at this or the next position, so the scan skips
    /// three bytes. Bytes before the first start sequence are never reported.
    pub fn scan(&mut self, buffer: &[u8]) -> &[NaluIndex] {
        self.indices.clear();

        let buffer_size = buffer.len();
        if buffer_size < NALU_SHORT_START_SEQUENCE_SIZE {
            return &self.indices;
        }

        let end = buffer_size - NALU_SHORT_START_SEQUENCE_SIZE;
        let mut i = 0;
        while i < end {
            match buffer[i + 2] {
                0 => i += 1,
                1 => {
                    if buffer[i + 1] == 0 && buffer[i] == 0 {
                        let mut start_offset = i;
                        // 00 00 00 01
                        if start_offset > 0 && buffer[start_offset - 1] == 0 {
                            start_offset -= 1;
                        }

                        if let Some(previous) = self.indices.last_mut() {
                            previous.payload_size = start_offset - previous.payload_start_offset;
                        }

                        self.indices.push(NaluIndex {
                            start_offset,
                            payload_start_offset: i + NALU_SHORT_START_SEQUENCE_SIZE,
                            payload_size: 0,
                        });
                    }
                    i += 3;
                }
                _ => i += 3,
            }
        }

        if let Some(last) = self.indices.last_mut() {
            last.payload_size = buffer_size - last.payload_start_offset;
        }

        tracing::trace!(
            "Scanned {} bytes, found {} NAL units.",
            buffer_size,
            self.indices.len()
        );

        &self.indices
    }

    pub fn indices(&self) -> &[NaluIndex] {
        &self.indices
    }

    pub fn reset(&mut self) {
        self.indices.clear();
    }
}

/// One-shot variant of [`NaluScanner::scan`] for callers outside the hot path.
pub fn find_nalu_indices(buffer: &[u8]) -> Vec<NaluIndex> {
    let mut scanner = NaluScanner::new();
    scanner.scan(buffer);
    scanner.indices
}
