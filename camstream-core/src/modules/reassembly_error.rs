use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReassemblyError {
    /// The record does not fit into what is left of the frame buffer.
    #[error("frame buffer exhausted: record needs {required} bytes, {remaining} remaining")]
    CapacityExceeded { required: usize, remaining: usize },
    #[error("NAL unit of {0} bytes does not fit a 32-bit length prefix")]
    PayloadTooLarge(usize),
}
