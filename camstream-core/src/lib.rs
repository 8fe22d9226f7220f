pub mod modules;

pub use modules::constants;
pub use modules::{
    bootstrapper::LateJoinBootstrapper,
    client::{Client, ClientId, ClientState, MockVideoTrack, VideoTrack},
    client_registry::ClientRegistry,
    control::{Actuator, ActuatorChannel, ControlMessage, ControlRelay, MockActuator},
    control_error::ControlError,
    dispatcher::{DispatchSummary, FrameDispatcher},
    frame_buffer::FrameBuffer,
    keyframe_cache::KeyframeCache,
    nalu::{find_nalu_indices, NaluIndex, NaluScanner, NaluType},
    pipeline::{EncodedBuffer, FrameOutcome, Pipeline, PipelineConfig, PipelineHandle},
    reassembler::FrameReassembler,
    reassembly_error::ReassemblyError,
    rtp_clock::{RtpClock, RtpTiming},
};
