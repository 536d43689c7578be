//! Codec error handling

use crate::format::Format;

/// Result type for pixel conversions
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while converting texture data to RGBA8
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("format {0:?} cannot be converted to RGBA8")]
    UnsupportedFormat(Format),

    #[error("texture data too short: expected {expected} bytes, got {actual}")]
    DataTooShort { expected: usize, actual: usize },

    #[error("failed to decode {format:?} data: {reason}")]
    Decode { format: Format, reason: String },
}
