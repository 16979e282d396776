//! Decode errors.

use thiserror::Error;

/// Policy class of a failure.
///
/// Every error in the workspace maps onto one of these, which decides whether
/// the caller aborts the current extraction or degrades the affected slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Out-of-range addresses, truncated buffers, descriptor/length mismatches.
    DataCorruption,
    /// An unresolved tag or bitmap reference.
    MissingReference,
    /// Unknown vertex format ids and unsupported index layouts.
    FormatUnsupported,
}

/// Errors produced while decoding cache data.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("read of {len} bytes at 0x{offset:X} exceeds data of {available} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        available: usize,
    },

    #[error("{what}: expected {expected} bytes, found {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("malformed record: {0}")]
    Record(#[from] binrw::Error),

    #[error("negative {what} count {value}")]
    NegativeCount { what: &'static str, value: i32 },

    #[error("fixup slot {slot} out of range ({len} fixups)")]
    FixupOutOfRange { slot: usize, len: usize },

    #[error("unknown vertex format {0}")]
    UnknownVertexFormat(u16),

    #[error("unsupported index format {0}")]
    UnsupportedIndexFormat(i32),

    #[error("invalid vertex template {format}: {reason}")]
    InvalidTemplate { format: u16, reason: String },

    #[error("malformed vertex template table: {0}")]
    TemplateSyntax(#[from] serde_json::Error),
}

impl DecodeError {
    /// The policy class this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfBounds { .. }
            | Self::LengthMismatch { .. }
            | Self::Record(_)
            | Self::NegativeCount { .. }
            | Self::FixupOutOfRange { .. } => ErrorKind::DataCorruption,
            Self::UnknownVertexFormat(_)
            | Self::UnsupportedIndexFormat(_)
            | Self::InvalidTemplate { .. }
            | Self::TemplateSyntax(_) => ErrorKind::FormatUnsupported,
        }
    }
}

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
