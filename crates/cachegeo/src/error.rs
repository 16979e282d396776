//! Extraction errors.

use cachegeo_decode::{DecodeError, ErrorKind};
use thiserror::Error;

/// Errors that abort an extraction call.
///
/// Unresolved shader and bitmap references never surface here; they degrade
/// to null placeholders or dropped mappings instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("missing global tag of class '{class}'")]
    MissingTag { class: &'static str },

    #[error("unresolved {class} reference {id}")]
    UnresolvedReference { class: &'static str, id: i32 },

    #[error("resource index {index} out of range ({len} entries)")]
    ResourceIndexOutOfRange { index: usize, len: usize },

    #[error("address 0x{address:X} is outside the cache")]
    AddressOutOfRange { address: i64 },

    #[error("no resource data for resource 0x{0:08X}")]
    MissingResourceData(u32),

    #[error("geometry has no sections with index buffers")]
    NoEdges,

    #[error("instanced section {0} produced no mesh")]
    InstancedSectionMissing(usize),

    #[error("geometry instance {instance} has no subset ({subsets} subsets)")]
    InstanceSubsetMissing { instance: usize, subsets: usize },
}

impl Error {
    /// The policy class this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(e) => e.kind(),
            Self::MissingTag { .. } | Self::UnresolvedReference { .. } => {
                ErrorKind::MissingReference
            }
            Self::NoEdges => ErrorKind::FormatUnsupported,
            Self::ResourceIndexOutOfRange { .. }
            | Self::AddressOutOfRange { .. }
            | Self::MissingResourceData(_)
            | Self::InstancedSectionMissing(_)
            | Self::InstanceSubsetMissing { .. } => ErrorKind::DataCorruption,
        }
    }
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;
