use std::path::PathBuf;

use camstream_core::constants::{DEFAULT_FRAME_BUFFER_CAPACITY, DEFAULT_VIDEO_CLOCK_RATE};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Stream an H.264 camera to late-joining viewers")]
pub struct Args {
    /// Annex-B H.264 elementary stream standing in for the camera encoder
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Address viewers connect to
    #[arg(short = 'd', long = "ip", default_value = "0.0.0.0")]
    pub ip: String,

    #[arg(short = 'p', long = "port", default_value_t = 8000)]
    pub port: u16,

    /// Frames per second used to stamp the input file
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Start over at the end of the input file
    #[arg(long = "loop")]
    pub loop_input: bool,

    #[arg(long, default_value_t = DEFAULT_VIDEO_CLOCK_RATE)]
    pub clock_rate: u32,

    /// Upper bound in bytes for one reassembled frame
    #[arg(long, default_value_t = DEFAULT_FRAME_BUFFER_CAPACITY)]
    pub frame_buffer_capacity: usize,

    #[arg(short = 'l', long = "log", help = "Log Level", default_value = "INFO")]
    pub log_level: String,

    /// Directory for the hourly rolling log files
    #[arg(long, default_value = "./log")]
    pub log_dir: PathBuf,
}
