pub(crate) mod actuator;
pub(crate) mod channel_track;
pub(crate) mod cli;
pub(crate) mod config;
pub(crate) mod decode_error;
pub(crate) mod file_source;
pub(crate) mod logging;
pub(crate) mod viewer_record;
pub(crate) mod viewer_server;
