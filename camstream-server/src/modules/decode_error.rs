use thiserror::Error;

/// Failure to take a [`ViewerRecord`](crate::ViewerRecord) off a byte stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The record header or payload has not fully arrived yet.
    #[error("viewer record is incomplete")]
    NeedMoreData,
    #[error("unknown viewer record kind {0:#x}")]
    UnknownKind(u8),
}
