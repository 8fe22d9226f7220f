use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
};

use anyhow::{bail, Context, Result};
use camstream_core::PipelineConfig;

use crate::modules::cli::Args;

#[derive(Debug, Clone)]
pub struct StreamerConfig {
    pub input: PathBuf,
    pub bind_addr: SocketAddr,
    pub fps: u32,
    pub loop_input: bool,
    pub pipeline: PipelineConfig,
}

impl StreamerConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        if args.fps == 0 {
            bail!("fps must be greater than zero");
        }
        if args.clock_rate == 0 {
            bail!("clock rate must be greater than zero");
        }
        if args.frame_buffer_capacity == 0 {
            bail!("frame buffer capacity must be greater than zero");
        }

        let ip: IpAddr = args
            .ip
            .trim()
            .parse()
            .with_context(|| format!("invalid ip address: {}", args.ip))?;

        Ok(Self {
            input: args.input.clone(),
            bind_addr: SocketAddr::new(ip, args.port),
            fps: args.fps,
            loop_input: args.loop_input,
            pipeline: PipelineConfig {
                clock_rate: args.clock_rate,
                frame_buffer_capacity: args.frame_buffer_capacity,
            },
        })
    }

    pub fn frame_duration_us(&self) -> u64 {
        1_000_000 / self.fps as u64
    }
}
