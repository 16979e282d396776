//! Byte order handling and post-build normalization.

use binrw::Endian;

use crate::index::IndexBuffer;
use crate::vertex::VertexBuffer;

/// Byte order of multi-byte scalars in a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    /// The order buffer builders decode raw bytes in.
    pub const DECODE_NATIVE: Self = Self::Little;

    /// Whether buffers decoded in [`Self::DECODE_NATIVE`] order must be
    /// reversed to reflect data stored in `self` order.
    #[must_use]
    pub fn needs_reversal(self) -> bool {
        self != Self::DECODE_NATIVE
    }

    /// The matching [`Endian`] for record parsing.
    #[must_use]
    pub fn endian(self) -> Endian {
        match self {
            Self::Little => Endian::Little,
            Self::Big => Endian::Big,
        }
    }
}

/// Reverse every multi-byte scalar of every buffer built for one extraction
/// when the cache's byte order differs from the decode order.
///
/// Must be called exactly once per buffer, after all buffers for the call
/// are built.
///
/// # Returns
///
/// Whether a reversal was applied.
pub fn normalize_endianness<'a>(
    order: ByteOrder,
    vertex_buffers: impl IntoIterator<Item = &'a mut VertexBuffer>,
    index_buffers: impl IntoIterator<Item = &'a mut IndexBuffer>,
) -> bool {
    if !order.needs_reversal() {
        return false;
    }

    for buffer in vertex_buffers {
        buffer.reverse_endianness();
    }
    for buffer in index_buffers {
        buffer.reverse_endianness();
    }
    true
}
