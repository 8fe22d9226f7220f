use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};

use mockall::automock;

use crate::modules::rtp_clock::RtpTiming;

pub type ClientId = uuid::Uuid;

/// Outbound video leg of one viewer, owned by the transport.
///
/// Every method must return without waiting on the network; the pipeline
/// calls them from the camera thread.
#[automock]
pub trait VideoTrack: Send + Sync + 'static {
    /// Hands one frame, a run of length prefixed NAL units, to the transport.
    fn send(&self, frame: &[u8], timestamp: u32) -> anyhow::Result<()>;
    fn last_reported_timestamp(&self) -> u32;
    /// Asks the transport to emit a sender report with the next frame.
    fn set_needs_report(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Track open, bootstrap not yet run.
    Waiting,
    Ready,
}

pub struct Client {
    id: ClientId,
    ready: AtomicBool,
    // short term lock, only taken around timestamp updates
    timing: Mutex<RtpTiming>,
    track: Arc<dyn VideoTrack>,
}

impl Client {
    pub fn new(id: ClientId, track: Arc<dyn VideoTrack>, start_timestamp: u32) -> Self {
        Self {
            id,
            ready: AtomicBool::new(false),
            timing: Mutex::new(RtpTiming::new(start_timestamp)),
            track,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn state(&self) -> ClientState {
        if self.ready.load(Ordering::Acquire) {
            ClientState::Ready
        } else {
            ClientState::Waiting
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ClientState::Ready
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    pub fn track(&self) -> &dyn VideoTrack {
        self.track.as_ref()
    }

    pub fn timing(&self) -> RtpTiming {
        *self.timing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_timing<R>(&self, f: impl FnOnce(&mut RtpTiming) -> R) -> R {
        let mut timing = self.timing.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut timing)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("timing", &self.timing())
            .finish()
    }
}
