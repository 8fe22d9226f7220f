use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use anyhow::{anyhow, Context, Result};
use camstream_core::{ClientRegistry, ControlRelay, Pipeline};
use tokio::sync::oneshot;

mod modules;
pub use modules::{
    actuator::LoggingActuator,
    channel_track::ChannelTrack,
    cli::Args,
    config::StreamerConfig,
    decode_error::DecodeError,
    file_source::{AnnexBFileSource, SourceChunk},
    logging::init_logging,
    viewer_record::ViewerRecord,
    viewer_server::ViewerServer,
};

/// Runs the pipeline on its own OS thread, the way a camera driver calls back
/// on its encoder thread.
pub fn spawn_camera_thread(
    source: AnnexBFileSource,
    mut pipeline: Pipeline,
    frame_duration_us: u64,
    loop_input: bool,
    stop: Arc<AtomicBool>,
) -> Result<thread::JoinHandle<usize>> {
    thread::Builder::new()
        .name("camera".to_string())
        .spawn(move || source.run(&mut pipeline, frame_duration_us, loop_input, &stop))
        .context("failed to spawn camera thread")
}

pub async fn run_streamer(
    config: StreamerConfig,
    shutdown_signal: oneshot::Receiver<()>,
) -> Result<()> {
    let source = AnnexBFileSource::open(&config.input)?;
    tracing::info!(
        "Loaded {} encoder buffers from {}",
        source.len(),
        config.input.display()
    );

    let registry = Arc::new(ClientRegistry::new());
    let (pipeline, pipeline_handle) = Pipeline::new(config.pipeline, registry.clone());

    let control = Arc::new(ControlRelay::new(Arc::new(LoggingActuator::new())));
    control.center_all()?;

    let server =
        ViewerServer::bind(config.bind_addr, registry, pipeline_handle, control.clone()).await?;

    let stop = Arc::new(AtomicBool::new(false));
    let camera = spawn_camera_thread(
        source,
        pipeline,
        config.frame_duration_us(),
        config.loop_input,
        stop.clone(),
    )?;

    let (server_shutdown_tx, server_shutdown_rx) = oneshot::channel();
    let server_task = tokio::spawn(server.run(server_shutdown_rx));

    // a dropped sender counts as a shutdown request
    let _ = shutdown_signal.await;

    stop.store(true, Ordering::Relaxed);
    let _ = server_shutdown_tx.send(());
    server_task.await??;

    let frames = tokio::task::spawn_blocking(move || camera.join())
        .await?
        .map_err(|_| anyhow!("camera thread panicked"))?;
    tracing::info!("Streamed {} frames.", frames);

    control.center_all()
}
