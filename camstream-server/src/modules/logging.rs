use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{
    filter::{Directive, LevelFilter},
    fmt, EnvFilter, Layer, Registry,
};

pub fn init_logging(log_level: &str, log_dir: &Path) -> Result<()> {
    let default_directive: Directive = log_level
        .to_lowercase()
        .parse()
        .with_context(|| format!("invalid log level: {}", log_level))?;

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(default_directive)
                .from_env_lossy(),
        );

    let file_layer = fmt::layer()
        .with_writer(rolling::hourly(log_dir, "camstream"))
        .with_ansi(false)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::DEBUG.into())
                .from_env_lossy(),
        );

    Registry::default()
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("logging is already initialized")
}
