use std::sync::{
    mpsc::{self, Receiver, Sender},
    Arc,
};

use anyhow::{anyhow, Result};

use crate::{
    constants::{DEFAULT_FRAME_BUFFER_CAPACITY, DEFAULT_VIDEO_CLOCK_RATE},
    modules::{
        bootstrapper::LateJoinBootstrapper,
        client::ClientId,
        client_registry::ClientRegistry,
        dispatcher::{DispatchSummary, FrameDispatcher},
        frame_buffer::FrameBuffer,
        keyframe_cache::KeyframeCache,
        reassembler::FrameReassembler,
        rtp_clock::RtpClock,
    },
};

/// One chunk of encoder output as delivered by the camera callback.
#[derive(Debug, Clone, Copy)]
pub struct EncodedBuffer<'a> {
    pub data: &'a [u8],
    pub pts_us: u64,
    /// Set on configuration buffers; the next buffer completes the frame.
    pub is_config: bool,
}

impl<'a> EncodedBuffer<'a> {
    pub fn new(data: &'a [u8], pts_us: u64, is_config: bool) -> Self {
        Self {
            data,
            pts_us,
            is_config,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Waiting for the rest of the access unit.
    Pending,
    Dispatched(DispatchSummary),
    /// The frame did not fit the frame buffer and was discarded.
    Dropped,
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub clock_rate: u32,
    pub frame_buffer_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            clock_rate: DEFAULT_VIDEO_CLOCK_RATE,
            frame_buffer_capacity: DEFAULT_FRAME_BUFFER_CAPACITY,
        }
    }
}

/// Queues work that must run on the pipeline's thread.
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    bootstrap_sender: Sender<ClientId>,
}

impl PipelineHandle {
    /// Bootstrap runs before the pipeline handles its next encoder buffer.
    pub fn request_bootstrap(&self, client_id: ClientId) -> Result<()> {
        self.bootstrap_sender
            .send(client_id)
            .map_err(|_| anyhow!("pipeline is gone, cannot bootstrap client {}", client_id))
    }
}

/// Scanner, reassembler, keyframe cache and dispatcher for one camera.
///
/// Owned and driven by a single thread. The frame buffer and keyframe cache
/// are never shared; other threads reach the pipeline only through the
/// client registry and a [`PipelineHandle`].
pub struct Pipeline {
    registry: Arc<ClientRegistry>,
    reassembler: FrameReassembler,
    frame_buffer: FrameBuffer,
    cache: KeyframeCache,
    // records of the frame being assembled, committed once it completes
    staged: KeyframeCache,
    dispatcher: FrameDispatcher,
    bootstrapper: LateJoinBootstrapper,
    bootstrap_receiver: Receiver<ClientId>,
    pending_frame: bool,
    last_pts_us: Option<u64>,
    last_frame_duration_us: u64,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, registry: Arc<ClientRegistry>) -> (Self, PipelineHandle) {
        let clock = RtpClock::new(config.clock_rate);
        let (bootstrap_sender, bootstrap_receiver) = mpsc::channel();

        let pipeline = Self {
            registry,
            reassembler: FrameReassembler::new(),
            frame_buffer: FrameBuffer::new(config.frame_buffer_capacity),
            cache: KeyframeCache::new(),
            staged: KeyframeCache::new(),
            dispatcher: FrameDispatcher::new(clock),
            bootstrapper: LateJoinBootstrapper::new(clock),
            bootstrap_receiver,
            pending_frame: false,
            last_pts_us: None,
            last_frame_duration_us: 0,
        };

        (pipeline, PipelineHandle { bootstrap_sender })
    }

    /// Entry point of the encoder callback.
    pub fn on_buffer(&mut self, buffer: EncodedBuffer<'_>) -> FrameOutcome {
        self.process_bootstrap_requests();

        if self.pending_frame {
            self.pending_frame = false;
        } else {
            self.frame_buffer.reset();
            self.staged.clear();
            if buffer.is_config {
                self.pending_frame = true;
            }
        }

        // configuration buffers carry no picture of their own
        if !buffer.is_config {
            self.last_frame_duration_us = match self.last_pts_us {
                Some(last_pts_us) => buffer.pts_us.saturating_sub(last_pts_us),
                None => 0,
            };
            self.last_pts_us = Some(buffer.pts_us);
        }

        if let Err(err) = self
            .reassembler
            .reassemble(buffer.data, &mut self.frame_buffer, &mut self.staged)
        {
            tracing::warn!("Dropped frame at pts {}us: {}", buffer.pts_us, err);
            self.frame_buffer.reset();
            self.staged.clear();
            self.pending_frame = false;
            return FrameOutcome::Dropped;
        }

        if self.pending_frame {
            return FrameOutcome::Pending;
        }

        self.cache.absorb(&mut self.staged);

        let summary = self.dispatcher.dispatch(
            &self.registry,
            self.frame_buffer.as_slice(),
            self.last_frame_duration_us,
        );
        FrameOutcome::Dispatched(summary)
    }

    /// Runs every queued late-join bootstrap and marks those clients ready.
    pub fn process_bootstrap_requests(&mut self) {
        while let Ok(client_id) = self.bootstrap_receiver.try_recv() {
            let client = match self.registry.get(&client_id) {
                Some(client) => client,
                None => {
                    tracing::debug!(%client_id, "Client left before bootstrap.");
                    continue;
                }
            };

            if let Err(err) = self
                .bootstrapper
                .bootstrap(&client, &self.cache, self.last_frame_duration_us)
            {
                tracing::warn!(%client_id, "Bootstrap failed: {:?}", err);
            }
            client.mark_ready();
            tracing::info!(%client_id, "Client added to stream.");
        }
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &KeyframeCache {
        &self.cache
    }

    /// Records accumulated for the current frame.
    pub fn frame(&self) -> &[u8] {
        self.frame_buffer.as_slice()
    }

    pub fn is_pending(&self) -> bool {
        self.pending_frame
    }

    pub fn last_frame_duration_us(&self) -> u64 {
        self.last_frame_duration_us
    }
}
