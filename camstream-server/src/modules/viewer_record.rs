use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::modules::decode_error::DecodeError;

const FRAME_KIND: u8 = 0x0;
const SENDER_REPORT_KIND: u8 = 0x1;
// kind (8) + rtp timestamp (32) + payload length (32)
const HEADER_SIZE: usize = 9;

/// Record written to a viewer connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerRecord {
    /// Length prefixed NAL units stamped with the client's RTP timestamp.
    Frame { timestamp: u32, payload: Bytes },
    /// Sender report carrying the RTP timestamp it was taken at.
    SenderReport { timestamp: u32 },
}

impl ViewerRecord {
    pub fn timestamp(&self) -> u32 {
        match self {
            ViewerRecord::Frame { timestamp, .. } => *timestamp,
            ViewerRecord::SenderReport { timestamp } => *timestamp,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            ViewerRecord::Frame { timestamp, payload } => {
                buf.reserve(HEADER_SIZE + payload.len());
                buf.put_u8(FRAME_KIND);
                buf.put_u32(*timestamp);
                buf.put_u32(payload.len() as u32);
                buf.extend_from_slice(payload);
            }
            ViewerRecord::SenderReport { timestamp } => {
                buf.put_u8(SENDER_REPORT_KIND);
                buf.put_u32(*timestamp);
                buf.put_u32(0);
            }
        }
    }

    /// Takes one complete record off the front of `buf`.
    ///
    /// On [`DecodeError::NeedMoreData`] nothing is consumed.
    pub fn decode(buf: &mut BytesMut) -> Result<Self, DecodeError> {
        if buf.len() < HEADER_SIZE {
            return Err(DecodeError::NeedMoreData);
        }

        let mut header = &buf[..HEADER_SIZE];
        let kind = header.get_u8();
        let timestamp = header.get_u32();
        let length = header.get_u32() as usize;

        if kind != FRAME_KIND && kind != SENDER_REPORT_KIND {
            return Err(DecodeError::UnknownKind(kind));
        }
        if buf.len() < HEADER_SIZE + length {
            return Err(DecodeError::NeedMoreData);
        }

        buf.advance(HEADER_SIZE);
        let payload = buf.split_to(length).freeze();

        let record = match kind {
            FRAME_KIND => ViewerRecord::Frame { timestamp, payload },
            _ => ViewerRecord::SenderReport { timestamp },
        };
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    mod success {
        use bytes::{Bytes, BytesMut};

        use crate::modules::viewer_record::ViewerRecord;

        #[test]
        fn encode_frame() {
            let record = ViewerRecord::Frame {
                timestamp: 0x01020304,
                payload: Bytes::from_static(&[0, 0, 0, 1, 0x41]),
            };
            let mut buf = BytesMut::new();

            record.encode(&mut buf);

            let expected_bytes_array = [
                0, // Kind (8)
                1, 2, 3, 4, // RTP Timestamp (32)
                0, 0, 0, 5, // Payload Length (32)
                0, 0, 0, 1, 0x41, // Payload (..)
            ];
            assert_eq!(buf.as_ref(), expected_bytes_array);
        }

        #[test]
        fn encode_sender_report() {
            let mut buf = BytesMut::new();

            ViewerRecord::SenderReport { timestamp: 90_000 }.encode(&mut buf);

            let expected_bytes_array = [
                1, // Kind (8)
                0, 1, 0x5F, 0x90, // RTP Timestamp (32)
                0, 0, 0, 0, // Payload Length (32)
            ];
            assert_eq!(buf.as_ref(), expected_bytes_array);
        }

        #[test]
        fn decode_consecutive_records() {
            let mut buf = BytesMut::from(
                &[
                    1, // Kind (8)
                    0, 0, 0, 7, // RTP Timestamp (32)
                    0, 0, 0, 0, // Payload Length (32)
                    0, // Kind (8)
                    0, 0, 0, 8, // RTP Timestamp (32)
                    0, 0, 0, 2, // Payload Length (32)
                    0x41, 0x9A, // Payload (..)
                ][..],
            );

            let report = ViewerRecord::decode(&mut buf).unwrap();
            let frame = ViewerRecord::decode(&mut buf).unwrap();

            assert_eq!(report, ViewerRecord::SenderReport { timestamp: 7 });
            assert_eq!(
                frame,
                ViewerRecord::Frame {
                    timestamp: 8,
                    payload: Bytes::from_static(&[0x41, 0x9A]),
                }
            );
            assert_eq!(frame.timestamp(), 8);
            assert!(buf.is_empty());
        }
    }

    mod failure {
        use bytes::BytesMut;

        use crate::modules::{decode_error::DecodeError, viewer_record::ViewerRecord};

        #[test]
        fn decode_partial_record() {
            let bytes_array = [
                0, // Kind (8)
                0, 0, 0, 1, // RTP Timestamp (32)
                0, 0, 0, 4, // Payload Length (32)
                0x65, 0x88, // two of four payload bytes
            ];
            let mut buf = BytesMut::from(&bytes_array[..]);

            assert_eq!(
                ViewerRecord::decode(&mut buf),
                Err(DecodeError::NeedMoreData)
            );
            assert_eq!(buf.len(), bytes_array.len());

            let mut header = BytesMut::from(&bytes_array[..4]);
            assert_eq!(
                ViewerRecord::decode(&mut header),
                Err(DecodeError::NeedMoreData)
            );
        }

        #[test]
        fn decode_unknown_kind() {
            let mut buf = BytesMut::from(&[7u8, 0, 0, 0, 0, 0, 0, 0, 0][..]);

            assert_eq!(
                ViewerRecord::decode(&mut buf),
                Err(DecodeError::UnknownKind(7))
            );
        }
    }
}
