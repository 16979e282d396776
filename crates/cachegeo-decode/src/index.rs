//! Index buffer decoding and topology helpers.

use std::io::Cursor;

use binrw::{BinRead, VecArgs};

use crate::endian::ByteOrder;
use crate::error::{DecodeError, DecodeResult};

/// Primitive topology declared by an index buffer descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleFan,
    TriangleStrip,
    QuadList,
    RectList,
}

impl TryFrom<i32> for IndexFormat {
    type Error = DecodeError;

    fn try_from(value: i32) -> DecodeResult<Self> {
        Ok(match value {
            0 => Self::PointList,
            1 => Self::LineList,
            2 => Self::LineStrip,
            3 => Self::TriangleList,
            4 => Self::TriangleFan,
            5 => Self::TriangleStrip,
            6 => Self::QuadList,
            7 => Self::RectList,
            other => return Err(DecodeError::UnsupportedIndexFormat(other)),
        })
    }
}

/// Stored width of each index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexWidth {
    U16,
    U32,
}

impl IndexWidth {
    /// 32-bit indices are needed once a buffer has more vertices than a
    /// `u16` can address.
    #[must_use]
    pub fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count > usize::from(u16::MAX) {
            Self::U32
        } else {
            Self::U16
        }
    }

    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// A decoded, ordered index sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBuffer {
    format: IndexFormat,
    width: IndexWidth,
    indices: Vec<u32>,
}

/// Decode raw index bytes for a buffer owned by `vertex_count` vertices.
///
/// Indices are decoded in [`crate::ByteOrder::DECODE_NATIVE`] order.
pub fn build_index_buffer(
    data: &[u8],
    vertex_count: usize,
    format: IndexFormat,
) -> DecodeResult<IndexBuffer> {
    let width = IndexWidth::for_vertex_count(vertex_count);
    if data.len() % width.bytes() != 0 {
        return Err(DecodeError::LengthMismatch {
            what: "index buffer",
            expected: data.len() - data.len() % width.bytes(),
            actual: data.len(),
        });
    }

    let count = data.len() / width.bytes();
    let mut cursor = Cursor::new(data);
    let endian = ByteOrder::DECODE_NATIVE.endian();
    let indices = match width {
        IndexWidth::U16 => {
            Vec::<u16>::read_options(&mut cursor, endian, VecArgs { count, inner: () })?
                .into_iter()
                .map(u32::from)
                .collect()
        }
        IndexWidth::U32 => {
            Vec::<u32>::read_options(&mut cursor, endian, VecArgs { count, inner: () })?
        }
    };

    Ok(IndexBuffer {
        format,
        width,
        indices,
    })
}

impl IndexBuffer {
    /// Build from already-decoded values.
    #[must_use]
    pub fn from_indices(indices: Vec<u32>, width: IndexWidth, format: IndexFormat) -> Self {
        Self {
            format,
            width,
            indices,
        }
    }

    #[must_use]
    pub fn format(&self) -> IndexFormat {
        self.format
    }

    #[must_use]
    pub fn width(&self) -> IndexWidth {
        self.width
    }

    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Index values in `[start, start + count)`.
    pub fn subset(&self, start: usize, count: usize) -> DecodeResult<&[u32]> {
        start
            .checked_add(count)
            .and_then(|end| self.indices.get(start..end))
            .ok_or(DecodeError::OutOfBounds {
                offset: start,
                len: count,
                available: self.indices.len(),
            })
    }

    /// Expand `[start, start + count)` into a plain triangle list.
    ///
    /// Strips alternate winding and drop degenerate triangles, which also
    /// removes strip restarts. Fans pivot on the first index. Other
    /// non-triangle topologies yield no triangles.
    pub fn triangle_list(&self, start: usize, count: usize) -> DecodeResult<Vec<u32>> {
        let range = self.subset(start, count)?;
        Ok(match self.format {
            IndexFormat::TriangleList => range[..range.len() - range.len() % 3].to_vec(),
            IndexFormat::TriangleStrip => unstrip(range),
            IndexFormat::TriangleFan => match range.split_first() {
                Some((&pivot, rest)) => rest
                    .windows(2)
                    .flat_map(|w| [pivot, w[0], w[1]])
                    .collect(),
                None => Vec::new(),
            },
            _ => Vec::new(),
        })
    }

    /// Reverse the byte order of every index at its stored width.
    pub fn reverse_endianness(&mut self) {
        match self.width {
            IndexWidth::U16 => {
                for index in &mut self.indices {
                    *index = u32::from((*index as u16).swap_bytes());
                }
            }
            IndexWidth::U32 => {
                for index in &mut self.indices {
                    *index = index.swap_bytes();
                }
            }
        }
    }
}

fn unstrip(strip: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(strip.len().saturating_sub(2) * 3);
    for (i, w) in strip.windows(3).enumerate() {
        let (a, b, c) = (w[0], w[1], w[2]);
        if a == b || b == c || a == c {
            continue;
        }
        if i % 2 == 0 {
            out.extend([a, b, c]);
        } else {
            out.extend([b, a, c]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le16(values: &[u16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn width_follows_vertex_count() {
        assert_eq!(IndexWidth::for_vertex_count(65535), IndexWidth::U16);
        assert_eq!(IndexWidth::for_vertex_count(65536), IndexWidth::U32);
    }

    #[test]
    fn decodes_16_and_32_bit_indices() {
        let ib = build_index_buffer(&le16(&[0, 1, 2, 2, 1, 3]), 4, IndexFormat::TriangleList)
            .unwrap();
        assert_eq!(ib.indices(), [0, 1, 2, 2, 1, 3]);
        assert_eq!(ib.width(), IndexWidth::U16);

        let data: Vec<u8> = [70_000u32, 1].iter().flat_map(|v| v.to_le_bytes()).collect();
        let ib = build_index_buffer(&data, 80_000, IndexFormat::TriangleStrip).unwrap();
        assert_eq!(ib.indices(), [70_000, 1]);

        assert!(matches!(
            build_index_buffer(&[0; 3], 4, IndexFormat::TriangleList),
            Err(DecodeError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn rejects_unknown_topology() {
        assert_eq!(IndexFormat::try_from(5).unwrap(), IndexFormat::TriangleStrip);
        assert!(matches!(
            IndexFormat::try_from(9),
            Err(DecodeError::UnsupportedIndexFormat(9))
        ));
    }

    #[test]
    fn subsets_are_bounds_checked() {
        let ib = IndexBuffer::from_indices(vec![5, 6, 7, 8], IndexWidth::U16, IndexFormat::PointList);
        assert_eq!(ib.subset(1, 2).unwrap(), [6, 7]);
        assert!(ib.subset(3, 2).is_err());
        assert!(ib.subset(usize::MAX, 2).is_err());
    }

    #[test]
    fn strips_expand_without_degenerates() {
        let ib = IndexBuffer::from_indices(
            vec![0, 1, 2, 3, 3, 4, 4, 5, 6],
            IndexWidth::U16,
            IndexFormat::TriangleStrip,
        );
        assert_eq!(
            ib.triangle_list(0, 9).unwrap(),
            [0, 1, 2, 2, 1, 3, 4, 5, 6]
        );
    }

    #[test]
    fn fans_pivot_on_first_index() {
        let ib = IndexBuffer::from_indices(vec![0, 1, 2, 3], IndexWidth::U16, IndexFormat::TriangleFan);
        assert_eq!(ib.triangle_list(0, 4).unwrap(), [0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn reversal_respects_width() {
        let mut ib = IndexBuffer::from_indices(vec![0x0102], IndexWidth::U16, IndexFormat::PointList);
        ib.reverse_endianness();
        assert_eq!(ib.indices(), [0x0201]);

        let mut ib = IndexBuffer::from_indices(vec![0x0102], IndexWidth::U32, IndexFormat::PointList);
        ib.reverse_endianness();
        assert_eq!(ib.indices(), [0x0201_0000]);
    }
}
