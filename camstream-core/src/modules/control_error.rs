use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error("malformed control message: {0}")]
    Malformed(String),
    /// Pulse width outside of the servo range, in microseconds.
    #[error("pulse width {0}us is out of range")]
    OutOfRange(u16),
}
