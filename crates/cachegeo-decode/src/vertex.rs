//! Vertex buffer decoding.
//!
//! Raw vertex data is interleaved. Building a buffer splits it into one typed
//! channel per template entry, decoding lanes in [`ByteOrder::DECODE_NATIVE`]
//! order; [`crate::normalize_endianness`] fixes up big-endian caches later.
//!
//! [`ByteOrder::DECODE_NATIVE`]: crate::ByteOrder::DECODE_NATIVE

use glam::{Vec2, Vec3, Vec4};

use crate::element::{ElementType, Scalar};
use crate::error::{DecodeError, DecodeResult};
use crate::format::{ChannelUsage, VertexFormat, VertexFormatTable};

/// Scalar storage of a channel, `lanes` scalars per element.
#[derive(Debug, Clone, PartialEq)]
pub enum Lanes {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    F32(Vec<f32>),
}

impl Lanes {
    fn with_capacity(scalar: Scalar, capacity: usize) -> Self {
        match scalar {
            Scalar::U8 => Self::U8(Vec::with_capacity(capacity)),
            Scalar::U16 => Self::U16(Vec::with_capacity(capacity)),
            Scalar::U32 => Self::U32(Vec::with_capacity(capacity)),
            Scalar::F32 => Self::F32(Vec::with_capacity(capacity)),
        }
    }

    /// Append one element's scalars from little-endian bytes.
    fn push_le(&mut self, bytes: &[u8]) {
        match self {
            Self::U8(v) => v.extend_from_slice(bytes),
            Self::U16(v) => v.extend(
                bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]])),
            ),
            Self::U32(v) => v.extend(
                bytes
                    .chunks_exact(4)
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])),
            ),
            Self::F32(v) => v.extend(
                bytes
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])),
            ),
        }
    }

    fn scalar_count(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    fn slice(&self, start: usize, end: usize) -> Self {
        match self {
            Self::U8(v) => Self::U8(v[start..end].to_vec()),
            Self::U16(v) => Self::U16(v[start..end].to_vec()),
            Self::U32(v) => Self::U32(v[start..end].to_vec()),
            Self::F32(v) => Self::F32(v[start..end].to_vec()),
        }
    }

    fn reverse_endianness(&mut self) {
        match self {
            Self::U8(_) => {}
            Self::U16(v) => v.iter_mut().for_each(|x| *x = x.swap_bytes()),
            Self::U32(v) => v.iter_mut().for_each(|x| *x = x.swap_bytes()),
            Self::F32(v) => v
                .iter_mut()
                .for_each(|x| *x = f32::from_bits(x.to_bits().swap_bytes())),
        }
    }
}

/// One deinterleaved vertex channel.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexChannel {
    usage: ChannelUsage,
    element: ElementType,
    lanes: Lanes,
}

impl VertexChannel {
    #[must_use]
    pub fn usage(&self) -> ChannelUsage {
        self.usage
    }

    #[must_use]
    pub fn element(&self) -> ElementType {
        self.element
    }

    #[must_use]
    pub fn lanes(&self) -> &Lanes {
        &self.lanes
    }

    pub fn lanes_mut(&mut self) -> &mut Lanes {
        &mut self.lanes
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.scalar_count() / self.element.lanes()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode element `index` into a four-lane vector (unused lanes zero).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Vec4> {
        let n = self.element.lanes();
        let range = index * n..(index + 1) * n;
        Some(match &self.lanes {
            Lanes::U8(v) => self.element.decode_u8(v.get(range)?),
            Lanes::U16(v) => self.element.decode_u16(v.get(range)?),
            Lanes::U32(v) => self.element.decode_u32(*v.get(index)?),
            Lanes::F32(v) => ElementType::decode_f32(v.get(range)?),
        })
    }

    /// Decode every element.
    pub fn values(&self) -> impl Iterator<Item = Vec4> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }
}

/// A decoded vertex buffer. All channels share the same element count.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBuffer {
    format_id: u16,
    count: usize,
    channels: Vec<VertexChannel>,
}

impl VertexBuffer {
    #[must_use]
    pub fn format_id(&self) -> u16 {
        self.format_id
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[must_use]
    pub fn channels(&self) -> &[VertexChannel] {
        &self.channels
    }

    /// First channel with the given usage.
    #[must_use]
    pub fn channel(&self, usage: ChannelUsage) -> Option<&VertexChannel> {
        self.channels.iter().find(|c| c.usage == usage)
    }

    /// Every channel with the given usage.
    pub fn channels_mut(
        &mut self,
        usage: ChannelUsage,
    ) -> impl Iterator<Item = &mut VertexChannel> + '_ {
        self.channels.iter_mut().filter(move |c| c.usage == usage)
    }

    #[must_use]
    pub fn positions(&self) -> Option<Vec<Vec3>> {
        self.decode(ChannelUsage::Position, Vec4::truncate)
    }

    #[must_use]
    pub fn texcoords(&self) -> Option<Vec<Vec2>> {
        self.decode(ChannelUsage::Texcoord, |v| v.truncate().truncate())
    }

    #[must_use]
    pub fn normals(&self) -> Option<Vec<Vec3>> {
        self.decode(ChannelUsage::Normal, Vec4::truncate)
    }

    #[must_use]
    pub fn blend_indices(&self) -> Option<Vec<Vec4>> {
        self.decode(ChannelUsage::BlendIndices, |v| v)
    }

    #[must_use]
    pub fn blend_weights(&self) -> Option<Vec<Vec4>> {
        self.decode(ChannelUsage::BlendWeight, |v| v)
    }

    fn decode<T>(&self, usage: ChannelUsage, map: impl Fn(Vec4) -> T) -> Option<Vec<T>> {
        self.channel(usage).map(|c| c.values().map(&map).collect())
    }

    /// Copy `count` vertices starting at `start` into an independent buffer.
    pub fn slice(&self, start: usize, count: usize) -> DecodeResult<Self> {
        let end = start
            .checked_add(count)
            .filter(|&end| end <= self.count)
            .ok_or(DecodeError::OutOfBounds {
                offset: start,
                len: count,
                available: self.count,
            })?;

        let channels = self
            .channels
            .iter()
            .map(|c| {
                let n = c.element.lanes();
                VertexChannel {
                    usage: c.usage,
                    element: c.element,
                    lanes: c.lanes.slice(start * n, end * n),
                }
            })
            .collect();

        Ok(Self {
            format_id: self.format_id,
            count,
            channels,
        })
    }

    /// Reverse the byte order of every multi-byte scalar.
    pub fn reverse_endianness(&mut self) {
        for channel in &mut self.channels {
            channel.lanes.reverse_endianness();
        }
    }
}

/// Turns raw interleaved vertex bytes into a [`VertexBuffer`].
pub trait VertexBufferBuilder {
    /// Build a buffer of `vertex_count` vertices in format `format_id`.
    ///
    /// Fails with [`DecodeError::UnknownVertexFormat`] for unknown formats and
    /// [`DecodeError::LengthMismatch`] unless `data` is exactly
    /// `vertex_count × stride` bytes.
    fn build_vertex_buffer(
        &self,
        format_id: u16,
        vertex_count: usize,
        data: &[u8],
    ) -> DecodeResult<VertexBuffer>;
}

impl VertexBufferBuilder for VertexFormatTable {
    fn build_vertex_buffer(
        &self,
        format_id: u16,
        vertex_count: usize,
        data: &[u8],
    ) -> DecodeResult<VertexBuffer> {
        let format = self
            .get(format_id)
            .ok_or(DecodeError::UnknownVertexFormat(format_id))?;
        deinterleave(format, vertex_count, data)
    }
}

/// Split interleaved vertex bytes into per-channel storage.
pub fn deinterleave(
    format: &VertexFormat,
    vertex_count: usize,
    data: &[u8],
) -> DecodeResult<VertexBuffer> {
    let expected = vertex_count.saturating_mul(format.stride());
    if data.len() != expected {
        return Err(DecodeError::LengthMismatch {
            what: "vertex buffer",
            expected,
            actual: data.len(),
        });
    }

    let mut channels: Vec<VertexChannel> = format
        .channels()
        .iter()
        .map(|layout| VertexChannel {
            usage: layout.usage,
            element: layout.element,
            lanes: Lanes::with_capacity(
                layout.element.scalar(),
                vertex_count * layout.element.lanes(),
            ),
        })
        .collect();

    for vertex in data.chunks_exact(format.stride()) {
        for (channel, layout) in channels.iter_mut().zip(format.channels()) {
            let bytes = &vertex[layout.offset..layout.offset + layout.element.size()];
            channel.lanes.push_le(bytes);
        }
    }

    Ok(VertexBuffer {
        format_id: format.id(),
        count: vertex_count,
        channels,
    })
}
