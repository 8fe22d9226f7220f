pub mod bootstrapper;
pub mod client;
pub mod client_registry;
pub mod constants;
pub mod control;
pub mod control_error;
pub mod dispatcher;
pub mod frame_buffer;
pub mod keyframe_cache;
pub mod nalu;
pub mod pipeline;
pub mod reassembler;
pub mod reassembly_error;
pub mod rtp_clock;
