use crate::{
    constants::LENGTH_PREFIX_SIZE,
    modules::{
        frame_buffer::FrameBuffer,
        keyframe_cache::KeyframeCache,
        nalu::{NaluScanner, NaluType},
        reassembly_error::ReassemblyError,
    },
};

/// Rewrites Annex-B encoder output into length prefixed records.
#[derive(Debug, Default)]
pub struct FrameReassembler {
    scanner: NaluScanner,
}

impl FrameReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends every NAL unit found in `buffer` to `output` and refreshes
    /// `cache` with the records that carry a parameter set or IDR slice.
    ///
    /// Returns the number of units written. A buffer whose records do not all
    /// fit is rejected before anything is written, so neither `output` nor
    /// `cache` sees part of it.
    pub fn reassemble(
        &mut self,
        buffer: &[u8],
        output: &mut FrameBuffer,
        cache: &mut KeyframeCache,
    ) -> Result<usize, ReassemblyError> {
        let indices = self.scanner.scan(buffer);

        let required: usize = indices
            .iter()
            .map(|index| LENGTH_PREFIX_SIZE + index.payload_size)
            .sum();
        let remaining = output.capacity_remaining();
        if required > remaining {
            return Err(ReassemblyError::CapacityExceeded {
                required,
                remaining,
            });
        }

        for index in indices {
            let payload = &buffer[index.payload_range()];
            let record = output.append_length_prefixed(payload)?;

            // a zero sized unit has no header to classify
            if let Some(&header) = payload.first() {
                cache.update(NaluType::from_header(header), output.record(record));
            }
        }

        Ok(indices.len())
    }
}

#[cfg(test)]
mod tests {
    mod success {
        use crate::modules::{
            frame_buffer::FrameBuffer, keyframe_cache::KeyframeCache, nalu::NaluType,
            reassembler::FrameReassembler,
        };

        fn parse_records(mut bytes: &[u8]) -> Vec<(NaluType, Vec<u8>)> {
            let mut records = Vec::new();
            while bytes.len() >= 4 {
                let length = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
                let payload = bytes[4..4 + length].to_vec();
                records.push((NaluType::from_header(payload[0]), payload));
                bytes = &bytes[4 + length..];
            }
            records
        }

        #[test]
        fn reassemble_parameter_sets_and_idr() {
            let buffer = [
                0x00, 0x00, 0x00, 0x01, 0x67, 0xAA, // SPS
                0x00, 0x00, 0x01, 0x68, 0xBB, // PPS
                0x00, 0x00, 0x01, 0x65, 0xCC, // IDR
            ];
            let mut reassembler = FrameReassembler::new();
            let mut output = FrameBuffer::new(1024);
            let mut cache = KeyframeCache::new();

            let written = reassembler
                .reassemble(&buffer, &mut output, &mut cache)
                .unwrap();

            let expected_bytes_array = [
                0, 0, 0, 2, 0x67, 0xAA, // SPS
                0, 0, 0, 2, 0x68, 0xBB, // PPS
                0, 0, 0, 2, 0x65, 0xCC, // IDR
            ];
            assert_eq!(written, 3);
            assert_eq!(output.as_slice(), expected_bytes_array);
            assert_eq!(cache.get(NaluType::Sps).unwrap()[..], [0, 0, 0, 2, 0x67, 0xAA]);
            assert_eq!(cache.get(NaluType::Pps).unwrap()[..], [0, 0, 0, 2, 0x68, 0xBB]);
            assert_eq!(cache.get(NaluType::Idr).unwrap()[..], [0, 0, 0, 2, 0x65, 0xCC]);
            assert_eq!(cache.bootstrap_sequence()[..], expected_bytes_array);
        }

        #[test]
        fn reassembled_records_parse_back() {
            let units: Vec<Vec<u8>> = vec![
                vec![0x09, 0xF0],
                vec![0x67, 0x42, 0x00, 0x1F, 0x95],
                vec![0x68, 0xCE, 0x3C, 0x80],
                vec![0x06, 0x05, 0xFF],
                vec![0x65, 0x88, 0x84, 0x02, 0x10],
            ];
            let mut buffer = Vec::new();
            for unit in &units {
                buffer.extend_from_slice(&[0x00, 0x00, 0x00, 0x01]);
                buffer.extend_from_slice(unit);
            }
            let mut reassembler = FrameReassembler::new();
            let mut output = FrameBuffer::new(1024);
            let mut cache = KeyframeCache::new();

            reassembler
                .reassemble(&buffer, &mut output, &mut cache)
                .unwrap();

            let records = parse_records(output.as_slice());
            let expected: Vec<(NaluType, Vec<u8>)> = units
                .iter()
                .map(|unit| (NaluType::from_header(unit[0]), unit.clone()))
                .collect();
            assert_eq!(records, expected);
        }

        #[test]
        fn reassemble_zero_size_unit() {
            let buffer = [0x00, 0x00, 0x01, 0x00, 0x00, 0x01, 0x41, 0x9A];
            let mut reassembler = FrameReassembler::new();
            let mut output = FrameBuffer::new(64);
            let mut cache = KeyframeCache::new();

            let written = reassembler
                .reassemble(&buffer, &mut output, &mut cache)
                .unwrap();

            let expected_bytes_array = [
                0, 0, 0, 0, // empty unit
                0, 0, 0, 2, 0x41, 0x9A, // non-IDR slice
            ];
            assert_eq!(written, 2);
            assert_eq!(output.as_slice(), expected_bytes_array);
            assert!(cache.is_empty());
        }

        #[test]
        fn reassemble_appends_after_existing_records() {
            let mut reassembler = FrameReassembler::new();
            let mut output = FrameBuffer::new(64);
            let mut cache = KeyframeCache::new();

            reassembler
                .reassemble(&[0x00, 0x00, 0x01, 0x67, 0x01], &mut output, &mut cache)
                .unwrap();
            reassembler
                .reassemble(&[0x00, 0x00, 0x01, 0x65, 0x02], &mut output, &mut cache)
                .unwrap();

            assert_eq!(
                output.as_slice(),
                [0, 0, 0, 2, 0x67, 0x01, 0, 0, 0, 2, 0x65, 0x02]
            );
        }

        #[test]
        fn reassemble_without_start_sequence_leaves_output_untouched() {
            let mut reassembler = FrameReassembler::new();
            let mut output = FrameBuffer::new(64);
            let mut cache = KeyframeCache::new();
            output.append_length_prefixed(&[0x67]).unwrap();

            let written = reassembler
                .reassemble(&[0x12, 0x34, 0x56, 0x78], &mut output, &mut cache)
                .unwrap();

            assert_eq!(written, 0);
            assert_eq!(output.len(), 5);
        }
    }

    mod failure {
        use crate::modules::{
            frame_buffer::FrameBuffer, keyframe_cache::KeyframeCache, nalu::NaluType,
            reassembler::FrameReassembler, reassembly_error::ReassemblyError,
        };

        #[test]
        fn reassemble_beyond_capacity() {
            let buffer = [
                0x00, 0x00, 0x01, 0x67, 0xAA, // SPS, fits
                0x00, 0x00, 0x01, 0x65, 0x01, 0x02, 0x03, 0x04, // IDR, does not fit
            ];
            let mut reassembler = FrameReassembler::new();
            let mut output = FrameBuffer::new(10);
            let mut cache = KeyframeCache::new();

            let result = reassembler.reassemble(&buffer, &mut output, &mut cache);

            assert_eq!(
                result,
                Err(ReassemblyError::CapacityExceeded {
                    required: 15,
                    remaining: 10,
                })
            );
            assert!(output.is_empty());
            assert!(cache.is_empty());
        }

        #[test]
        fn rejected_buffer_keeps_cached_keyframe_consistent() {
            let mut reassembler = FrameReassembler::new();
            let mut output = FrameBuffer::new(18);
            let mut cache = KeyframeCache::new();
            let keyframe = [
                0x00, 0x00, 0x01, 0x67, 0xAA, // SPS
                0x00, 0x00, 0x01, 0x68, 0xBB, // PPS
                0x00, 0x00, 0x01, 0x65, 0xCC, // IDR
            ];
            reassembler
                .reassemble(&keyframe, &mut output, &mut cache)
                .unwrap();
            let cached = cache.bootstrap_sequence();
            output.reset();

            let next_keyframe = [
                0x00, 0x00, 0x01, 0x67, 0x11, // SPS
                0x00, 0x00, 0x01, 0x68, 0x22, // PPS
                0x00, 0x00, 0x01, 0x65, 0x33, 0x44, 0x55, // IDR, does not fit
            ];
            let result = reassembler.reassemble(&next_keyframe, &mut output, &mut cache);

            assert!(matches!(
                result,
                Err(ReassemblyError::CapacityExceeded {
                    required: 20,
                    remaining: 18,
                })
            ));
            assert_eq!(cache.bootstrap_sequence(), cached);
            assert_eq!(cache.get(NaluType::Sps).unwrap()[..], [0, 0, 0, 2, 0x67, 0xAA]);
        }
    }
}
