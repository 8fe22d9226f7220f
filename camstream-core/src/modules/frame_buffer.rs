use std::ops::Range;

use bytes::{BufMut, BytesMut};

use crate::{constants::LENGTH_PREFIX_SIZE, modules::reassembly_error::ReassemblyError};

/// Fixed capacity output region holding length prefixed NAL units.
///
/// Records are laid out as `[u32 big endian length][payload]` back to back.
/// The backing storage is allocated once; `reset` only rewinds the cursor.
#[derive(Debug)]
pub struct FrameBuffer {
    buf: BytesMut,
    capacity: usize,
}

impl FrameBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends one record and returns its bounds, length prefix included.
    pub fn append_length_prefixed(
        &mut self,
        payload: &[u8],
    ) -> Result<Range<usize>, ReassemblyError> {
        let length = u32::try_from(payload.len())
            .map_err(|_| ReassemblyError::PayloadTooLarge(payload.len()))?;

        let required = LENGTH_PREFIX_SIZE + payload.len();
        let remaining = self.capacity_remaining();
        if required > remaining {
            return Err(ReassemblyError::CapacityExceeded {
                required,
                remaining,
            });
        }

        let start = self.buf.len();
        self.buf.put_u32(length);
        self.buf.extend_from_slice(payload);

        Ok(start..self.buf.len())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn capacity_remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn record(&self, range: Range<usize>) -> &[u8] {
        &self.buf[range]
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }
}
