//! Fixup blob header and buffer address resolution.
//!
//! A geometry resource's fixup blob starts with the buffer descriptor tables
//! and ends with a small trailer holding the buffer counts. The per-buffer
//! fixups in the resource entry then locate each buffer's raw bytes.

use std::io::Cursor;

use binrw::{BinRead, binread};

use crate::endian::ByteOrder;
use crate::error::{DecodeError, DecodeResult};

/// Mask selecting the offset bits of a fixup value.
pub const FIXUP_OFFSET_MASK: u32 = 0x0FFF_FFFF;

/// Distance of the count trailer from the end of the fixup blob.
pub const TRAILER_SIZE: usize = 24;

/// Fixup-table slots reserved per vertex buffer before index buffers begin.
pub const FIXUP_SLOTS_PER_VERTEX_BUFFER: usize = 2;

/// A raw per-buffer fixup value.
///
/// The low 28 bits are an offset into the resource data; the top 4 bits are
/// an unrelated page/tag field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResourceFixup(pub u32);

impl ResourceFixup {
    #[must_use]
    pub fn offset(self) -> u32 {
        self.0 & FIXUP_OFFSET_MASK
    }

    #[must_use]
    pub fn page_bits(self) -> u8 {
        (self.0 >> 28) as u8
    }
}

/// Buffer counts stored in the fixup trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferCounts {
    pub vertex_buffers: usize,
    pub index_buffers: usize,
}

/// The count trailer at the end of a fixup blob.
#[binread]
#[derive(Debug, Clone, Copy)]
struct CountTrailer {
    #[br(pad_after = 8)]
    vertex_buffers: i32,
    #[br(pad_after = 8)]
    index_buffers: i32,
}

/// Read the vertex and index buffer counts from a fixup blob.
///
/// # Format
///
/// The trailer sits `fixup_size - 24` bytes past `fixup_offset`:
/// - `i32` vertex buffer count
/// - 8 reserved bytes
/// - `i32` index buffer count
/// - 8 reserved bytes
///
/// # Arguments
///
/// * `data` - The fixup data address space
/// * `order` - Byte order of the cache
/// * `fixup_offset` - First entry of the resource's fixup-offset list
/// * `fixup_size` - Size of the resource's fixup blob
pub fn read_buffer_counts(
    data: &[u8],
    order: ByteOrder,
    fixup_offset: usize,
    fixup_size: usize,
) -> DecodeResult<BufferCounts> {
    let trailer = fixup_size
        .checked_sub(TRAILER_SIZE)
        .ok_or(DecodeError::LengthMismatch {
            what: "fixup blob",
            expected: TRAILER_SIZE,
            actual: fixup_size,
        })?;

    let mut cursor = Cursor::new(data);
    cursor.set_position(fixup_offset.saturating_add(trailer) as u64);
    let raw = CountTrailer::read_options(&mut cursor, order.endian(), ())?;

    Ok(BufferCounts {
        vertex_buffers: count(raw.vertex_buffers, "vertex buffer")?,
        index_buffers: count(raw.index_buffers, "index buffer")?,
    })
}

fn count(value: i32, what: &'static str) -> DecodeResult<usize> {
    usize::try_from(value).map_err(|_| DecodeError::NegativeCount { what, value })
}

/// The `len` raw bytes of a buffer starting at `offset`.
pub fn buffer_bytes(data: &[u8], offset: usize, len: usize) -> DecodeResult<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(DecodeError::OutOfBounds {
            offset,
            len,
            available: data.len(),
        })
}

/// Maps buffer indices to raw-data offsets through a resource's fixups.
///
/// Vertex buffers occupy slots `[0, vertex_count)`; index buffers start after
/// two slots per vertex buffer.
#[derive(Debug, Clone, Copy)]
pub struct AddressResolver<'a> {
    fixups: &'a [ResourceFixup],
    vertex_buffer_count: usize,
}

impl<'a> AddressResolver<'a> {
    #[must_use]
    pub fn new(fixups: &'a [ResourceFixup], vertex_buffer_count: usize) -> Self {
        Self {
            fixups,
            vertex_buffer_count,
        }
    }

    /// Raw-data offset of vertex buffer `index`.
    pub fn vertex_buffer_offset(&self, index: usize) -> DecodeResult<usize> {
        self.slot_offset(index)
    }

    /// Raw-data offset of index buffer `index`.
    pub fn index_buffer_offset(&self, index: usize) -> DecodeResult<usize> {
        let slot = self
            .vertex_buffer_count
            .saturating_mul(FIXUP_SLOTS_PER_VERTEX_BUFFER)
            .saturating_add(index);
        self.slot_offset(slot)
    }

    fn slot_offset(&self, slot: usize) -> DecodeResult<usize> {
        self.fixups
            .get(slot)
            .map(|fixup| fixup.offset() as usize)
            .ok_or(DecodeError::FixupOutOfRange {
                slot,
                len: self.fixups.len(),
            })
    }
}
