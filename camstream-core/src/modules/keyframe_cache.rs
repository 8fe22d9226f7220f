use bytes::{Bytes, BytesMut};

use crate::modules::nalu::NaluType;

/// Latest SPS, PPS and IDR records, each stored with its length prefix.
///
/// Slots are replaced wholesale. The stored bytes are copies, since the frame
/// buffer they were read from is rewound on the next encoder callback.
#[derive(Debug, Default)]
pub struct KeyframeCache {
    sps: Option<Bytes>,
    pps: Option<Bytes>,
    idr: Option<Bytes>,
}

impl KeyframeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the record was cached.
    pub fn update(&mut self, nalu_type: NaluType, record: &[u8]) -> bool {
        let slot = match self.slot_mut(nalu_type) {
            Some(slot) => slot,
            None => return false,
        };
        *slot = Some(Bytes::copy_from_slice(record));

        tracing::trace!("Cached {:?} record of {} bytes.", nalu_type, record.len());
        true
    }

    pub fn get(&self, nalu_type: NaluType) -> Option<&Bytes> {
        match nalu_type {
            NaluType::Sps => self.sps.as_ref(),
            NaluType::Pps => self.pps.as_ref(),
            NaluType::Idr => self.idr.as_ref(),
            _ => None,
        }
    }

    /// SPS, then PPS, then IDR, skipping empty slots. A decoder needs the
    /// parameter sets before it can interpret slice data.
    pub fn bootstrap_sequence(&self) -> Bytes {
        let slots = [&self.sps, &self.pps, &self.idr];
        let total: usize = slots.into_iter().flatten().map(Bytes::len).sum();

        let mut sequence = BytesMut::with_capacity(total);
        for record in slots.into_iter().flatten() {
            sequence.extend_from_slice(record);
        }
        sequence.freeze()
    }

    pub fn is_empty(&self) -> bool {
        self.sps.is_none() && self.pps.is_none() && self.idr.is_none()
    }

    /// Moves every filled slot of `staged` into `self`, leaving `staged` empty.
    pub fn absorb(&mut self, staged: &mut KeyframeCache) {
        for (slot, staged_slot) in [
            (&mut self.sps, &mut staged.sps),
            (&mut self.pps, &mut staged.pps),
            (&mut self.idr, &mut staged.idr),
        ] {
            if let Some(record) = staged_slot.take() {
                *slot = Some(record);
            }
        }
    }

    pub fn clear(&mut self) {
        self.sps = None;
        self.pps = None;
        self.idr = None;
    }

    fn slot_mut(&mut self, nalu_type: NaluType) -> Option<&mut Option<Bytes>> {
        match nalu_type {
            NaluType::Sps => Some(&mut self.sps),
            NaluType::Pps => Some(&mut self.pps),
            NaluType::Idr => Some(&mut self.idr),
            _ => None,
        }
    }
}
