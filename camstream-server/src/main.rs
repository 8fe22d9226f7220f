use anyhow::Result;
use camstream_server::{init_logging, run_streamer, Args, StreamerConfig};
use clap::Parser;
use tokio::sync::oneshot;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = StreamerConfig::from_args(&args)?;
    init_logging(&args.log_level, &args.log_dir)?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let mut streamer = tokio::spawn(run_streamer(config, shutdown_rx));

    tokio::select! {
        result = &mut streamer => return result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl-C received, shutting down.");
        }
    }

    let _ = shutdown_tx.send(());
    streamer.await?
}
