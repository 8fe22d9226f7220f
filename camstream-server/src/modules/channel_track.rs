use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use anyhow::{bail, Result};
use bytes::Bytes;
use camstream_core::VideoTrack;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::modules::viewer_record::ViewerRecord;

/// Video track backed by the bounded queue of one viewer's writer task.
///
/// A viewer that stops reading fills its queue; further frames fail to send
/// and are dropped for that viewer only.
#[derive(Debug)]
pub struct ChannelTrack {
    sender: mpsc::Sender<ViewerRecord>,
    needs_report: AtomicBool,
    last_reported_timestamp: AtomicU32,
}

impl ChannelTrack {
    pub fn new(sender: mpsc::Sender<ViewerRecord>, start_timestamp: u32) -> Self {
        Self {
            sender,
            needs_report: AtomicBool::new(false),
            last_reported_timestamp: AtomicU32::new(start_timestamp),
        }
    }

    fn enqueue(&self, record: ViewerRecord) -> Result<()> {
        match self.sender.try_send(record) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => bail!("viewer queue is full"),
            Err(TrySendError::Closed(_)) => bail!("viewer connection closed"),
        }
    }
}

impl VideoTrack for ChannelTrack {
    fn send(&self, frame: &[u8], timestamp: u32) -> Result<()> {
        if self.needs_report.swap(false, Ordering::AcqRel) {
            if let Err(err) = self.enqueue(ViewerRecord::SenderReport { timestamp }) {
                self.needs_report.store(true, Ordering::Release);
                return Err(err);
            }
            self.last_reported_timestamp.store(timestamp, Ordering::Release);
        }

        self.enqueue(ViewerRecord::Frame {
            timestamp,
            payload: Bytes::copy_from_slice(frame),
        })
    }

    fn last_reported_timestamp(&self) -> u32 {
        self.last_reported_timestamp.load(Ordering::Acquire)
    }

    fn set_needs_report(&self) {
        self.needs_report.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    mod success {
        use bytes::Bytes;
        use camstream_core::VideoTrack;
        use tokio::sync::mpsc;

        use crate::modules::{channel_track::ChannelTrack, viewer_record::ViewerRecord};

        #[test]
        fn send_queues_frame() {
            let (sender, mut receiver) = mpsc::channel(8);
            let track = ChannelTrack::new(sender, 500);

            track.send(&[0, 0, 0, 1, 0x41], 3_500).unwrap();

            assert_eq!(
                receiver.try_recv().unwrap(),
                ViewerRecord::Frame {
                    timestamp: 3_500,
                    payload: Bytes::from_static(&[0, 0, 0, 1, 0x41]),
                }
            );
            assert!(receiver.try_recv().is_err());
            assert_eq!(track.last_reported_timestamp(), 500);
        }

        #[test]
        fn report_goes_out_before_next_frame() {
            let (sender, mut receiver) = mpsc::channel(8);
            let track = ChannelTrack::new(sender, 0);

            track.set_needs_report();
            track.send(&[0, 0, 0, 1, 0x41], 95_000).unwrap();
            track.send(&[0, 0, 0, 1, 0x41], 98_000).unwrap();

            assert_eq!(
                receiver.try_recv().unwrap(),
                ViewerRecord::SenderReport { timestamp: 95_000 }
            );
            assert_eq!(receiver.try_recv().unwrap().timestamp(), 95_000);
            assert_eq!(receiver.try_recv().unwrap().timestamp(), 98_000);
            assert_eq!(track.last_reported_timestamp(), 95_000);
        }

        #[test]
        fn stalled_viewer_recovers_once_drained() {
            let (sender, mut receiver) = mpsc::channel(1);
            let track = ChannelTrack::new(sender, 0);
            track.send(&[0, 0, 0, 1, 0x41], 1_000).unwrap();
            assert!(track.send(&[0, 0, 0, 1, 0x41], 2_000).is_err());

            receiver.try_recv().unwrap();

            track.send(&[0, 0, 0, 1, 0x41], 3_000).unwrap();
            assert_eq!(receiver.try_recv().unwrap().timestamp(), 3_000);
        }
    }

    mod failure {
        use camstream_core::VideoTrack;
        use tokio::sync::mpsc;

        use crate::modules::{channel_track::ChannelTrack, viewer_record::ViewerRecord};

        #[test]
        fn send_after_viewer_left() {
            let (sender, receiver) = mpsc::channel(8);
            let track = ChannelTrack::new(sender, 0);
            drop(receiver);

            assert!(track.send(&[0, 0, 0, 1, 0x41], 0).is_err());
        }

        #[test]
        fn send_to_full_queue() {
            let (sender, mut receiver) = mpsc::channel(2);
            let track = ChannelTrack::new(sender, 0);
            track.send(&[0, 0, 0, 1, 0x41], 1_000).unwrap();
            track.send(&[0, 0, 0, 1, 0x41], 2_000).unwrap();

            let result = track.send(&[0, 0, 0, 1, 0x41], 3_000);

            assert!(result.unwrap_err().to_string().contains("full"));
            assert_eq!(receiver.try_recv().unwrap().timestamp(), 1_000);
            assert_eq!(receiver.try_recv().unwrap().timestamp(), 2_000);
            assert!(receiver.try_recv().is_err());
        }

        #[test]
        fn report_stays_requested_while_queue_is_full() {
            let (sender, mut receiver) = mpsc::channel(1);
            let track = ChannelTrack::new(sender, 0);
            track.send(&[0, 0, 0, 1, 0x41], 1_000).unwrap();
            track.set_needs_report();

            assert!(track.send(&[0, 0, 0, 1, 0x41], 95_000).is_err());
            assert_eq!(track.last_reported_timestamp(), 0);

            receiver.try_recv().unwrap();
            // the report takes the only free slot, the frame does not fit
            assert!(track.send(&[0, 0, 0, 1, 0x41], 98_000).is_err());
            assert_eq!(
                receiver.try_recv().unwrap(),
                ViewerRecord::SenderReport { timestamp: 98_000 }
            );
            assert_eq!(track.last_reported_timestamp(), 98_000);
        }
    }
}
