//! Per-buffer descriptor tables.

use std::io::Cursor;

use binrw::{BinRead, binread};

use crate::endian::ByteOrder;
use crate::error::DecodeResult;
use crate::fixup::BufferCounts;

/// Bytes of the secondary per-vertex-buffer table between the two
/// descriptor tables.
pub const RESERVED_BYTES_PER_VERTEX_BUFFER: usize = 12;

/// Vertex buffer metadata (28-byte record).
#[binread]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VertexBufferDescriptor {
    #[br(pad_after = 4)]
    pub vertex_count: u32,
    #[br(pad_after = 16)]
    pub data_length: u32,
}

/// Index buffer metadata (28-byte record).
///
/// The format is kept raw; it is only validated for buffers that are built.
#[binread]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexBufferDescriptor {
    #[br(pad_after = 4)]
    pub index_format: i32,
    #[br(pad_after = 16)]
    pub data_length: u32,
}

/// The descriptor tables at the start of a geometry resource's fixup blob.
///
/// # Format
///
/// - `counts.vertex_buffers` × [`VertexBufferDescriptor`]
/// - `12 × counts.vertex_buffers` reserved bytes
/// - `counts.index_buffers` × [`IndexBufferDescriptor`]
#[binread]
#[br(import(counts: BufferCounts))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferDescriptorTable {
    #[br(count = counts.vertex_buffers)]
    pub vertex_buffers: Vec<VertexBufferDescriptor>,
    /// Opaque secondary table between the descriptor tables.
    #[br(count = RESERVED_BYTES_PER_VERTEX_BUFFER.saturating_mul(counts.vertex_buffers))]
    pub reserved: Vec<u8>,
    #[br(count = counts.index_buffers)]
    pub index_buffers: Vec<IndexBufferDescriptor>,
}

impl BufferDescriptorTable {
    /// Read the tables starting at `fixup_offset` of the fixup data.
    pub fn read_from(
        data: &[u8],
        order: ByteOrder,
        fixup_offset: usize,
        counts: BufferCounts,
    ) -> DecodeResult<Self> {
        let mut cursor = Cursor::new(data);
        cursor.set_position(fixup_offset as u64);
        Ok(Self::read_options(&mut cursor, order.endian(), (counts,))?)
    }

    /// Descriptor for a section's vertex buffer index. Negative or
    /// out-of-range indices resolve to `None`.
    #[must_use]
    pub fn vertex_buffer(&self, index: i16) -> Option<&VertexBufferDescriptor> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.vertex_buffers.get(i))
    }

    /// Descriptor for a section's index buffer index. Negative or
    /// out-of-range indices resolve to `None`.
    #[must_use]
    pub fn index_buffer(&self, index: i16) -> Option<&IndexBufferDescriptor> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.index_buffers.get(i))
    }
}
