use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use bytes::BytesMut;
use camstream_core::{Client, ClientId, ClientRegistry, ControlRelay, PipelineHandle};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpListener, TcpStream,
    },
    sync::{mpsc, oneshot},
};
use tracing::Instrument;

use crate::modules::{channel_track::ChannelTrack, viewer_record::ViewerRecord};

// records queued per viewer before frames start being dropped
const VIEWER_QUEUE_CAPACITY: usize = 1024;

/// Accepts viewer connections, one client per TCP stream.
///
/// The stream carries [`ViewerRecord`]s to the viewer; the viewer sends back
/// newline separated JSON control messages.
pub struct ViewerServer {
    listener: TcpListener,
    registry: Arc<ClientRegistry>,
    pipeline: PipelineHandle,
    control: Arc<ControlRelay>,
}

impl ViewerServer {
    pub async fn bind(
        addr: SocketAddr,
        registry: Arc<ClientRegistry>,
        pipeline: PipelineHandle,
        control: Arc<ControlRelay>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        Ok(Self {
            listener,
            registry,
            pipeline,
            control,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self, mut shutdown_signal: oneshot::Receiver<()>) -> Result<()> {
        tracing::info!("Viewer server listening on {}", self.local_addr()?);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer_addr) = match accepted {
                        Ok(accepted) => accepted,
                        Err(err) => {
                            tracing::warn!("Failed to accept viewer: {:?}", err);
                            continue;
                        }
                    };

                    let client_id = ClientId::new_v4();
                    let session = ViewerSession {
                        client_id,
                        registry: self.registry.clone(),
                        pipeline: self.pipeline.clone(),
                        control: self.control.clone(),
                    };
                    let span = tracing::info_span!("Viewer", %client_id, %peer_addr);
                    tokio::spawn(
                        async move {
                            if let Err(err) = session.handle(stream).await {
                                tracing::warn!("Viewer session ended with error: {:?}", err);
                            }
                        }
                        .instrument(span),
                    );
                }
                _ = &mut shutdown_signal => {
                    tracing::info!("Viewer server shutting down.");
                    return Ok(());
                }
            }
        }
    }
}

struct ViewerSession {
    client_id: ClientId,
    registry: Arc<ClientRegistry>,
    pipeline: PipelineHandle,
    control: Arc<ControlRelay>,
}

impl ViewerSession {
    async fn handle(self, stream: TcpStream) -> Result<()> {
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();

        let (record_sender, record_receiver) = mpsc::channel(VIEWER_QUEUE_CAPACITY);
        let start_timestamp: u32 = rand::random();
        let track = Arc::new(ChannelTrack::new(record_sender, start_timestamp));
        self.registry.insert(Arc::new(Client::new(
            self.client_id,
            track,
            start_timestamp,
        )));
        tracing::info!("Viewer connected, start timestamp {}.", start_timestamp);

        let writer = tokio::spawn(write_records(write_half, record_receiver).in_current_span());

        let result = match self.pipeline.request_bootstrap(self.client_id) {
            Ok(()) => self.read_control(read_half).await,
            Err(err) => Err(err),
        };

        self.registry.remove(&self.client_id);
        writer.abort();
        if let Err(err) = self.control.neutral_throttle() {
            tracing::warn!("Failed to stop throttle: {:?}", err);
        }
        tracing::info!("Viewer disconnected.");

        result
    }

    async fn read_control(&self, read_half: OwnedReadHalf) -> Result<()> {
        let mut lines = BufReader::new(read_half).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Err(err) = self.control.handle_text(line) {
                tracing::warn!("Ignored control message {:?}: {:?}", line, err);
            }
        }
        Ok(())
    }
}

async fn write_records(
    mut write_half: OwnedWriteHalf,
    mut record_receiver: mpsc::Receiver<ViewerRecord>,
) {
    let mut buf = BytesMut::new();
    while let Some(record) = record_receiver.recv().await {
        buf.clear();
        record.encode(&mut buf);
        if let Err(err) = write_half.write_all(&buf).await {
            tracing::debug!("Viewer write failed: {:?}", err);
            break;
        }
    }
}
