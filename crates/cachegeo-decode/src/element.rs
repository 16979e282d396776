//! Vertex element types and their scalar storage.

use glam::Vec4;
use serde::Deserialize;

/// Scalar storage of one element lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    U8,
    U16,
    U32,
    F32,
}

impl Scalar {
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 | Self::F32 => 4,
        }
    }
}

/// Element type of one vertex channel.
///
/// Names follow the lane layout: `u16n` is a normalized unsigned 16-bit lane,
/// `i16n` a normalized signed one. `hend3`, `dhen3`, `dec4` and `udec4` are
/// 32-bit packed vectors and count as a single scalar for byte-order purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum ElementType {
    #[serde(rename = "f32")]
    F32,
    #[serde(rename = "f32x2")]
    F32x2,
    #[serde(rename = "f32x3")]
    F32x3,
    #[serde(rename = "f32x4")]
    F32x4,
    #[serde(rename = "u8x4")]
    U8x4,
    #[serde(rename = "u8nx2")]
    U8Nx2,
    #[serde(rename = "u8nx4")]
    U8Nx4,
    #[serde(rename = "u16x2")]
    U16x2,
    #[serde(rename = "u16x4")]
    U16x4,
    #[serde(rename = "u16nx2")]
    U16Nx2,
    #[serde(rename = "u16nx4")]
    U16Nx4,
    #[serde(rename = "i16nx2")]
    I16Nx2,
    #[serde(rename = "i16nx4")]
    I16Nx4,
    #[serde(rename = "u32")]
    U32,
    /// 11/11/10 signed normalized.
    #[serde(rename = "hend3")]
    HenD3,
    /// 10/11/11 signed normalized.
    #[serde(rename = "dhen3")]
    DHen3,
    /// 10/10/10/2 signed normalized.
    #[serde(rename = "dec4")]
    Dec4,
    /// 10/10/10/2 unsigned normalized.
    #[serde(rename = "udec4")]
    UDec4,
}

impl ElementType {
    #[must_use]
    pub const fn scalar(self) -> Scalar {
        match self {
            Self::F32 | Self::F32x2 | Self::F32x3 | Self::F32x4 => Scalar::F32,
            Self::U8x4 | Self::U8Nx2 | Self::U8Nx4 => Scalar::U8,
            Self::U16x2
            | Self::U16x4
            | Self::U16Nx2
            | Self::U16Nx4
            | Self::I16Nx2
            | Self::I16Nx4 => Scalar::U16,
            Self::U32 | Self::HenD3 | Self::DHen3 | Self::Dec4 | Self::UDec4 => Scalar::U32,
        }
    }

    /// Number of stored scalars per element.
    #[must_use]
    pub const fn lanes(self) -> usize {
        match self {
            Self::F32 | Self::U32 | Self::HenD3 | Self::DHen3 | Self::Dec4 | Self::UDec4 => 1,
            Self::F32x2 | Self::U8Nx2 | Self::U16x2 | Self::U16Nx2 | Self::I16Nx2 => 2,
            Self::F32x3 => 3,
            Self::F32x4 | Self::U8x4 | Self::U8Nx4 | Self::U16x4 | Self::U16Nx4 | Self::I16Nx4 => 4,
        }
    }

    /// Size of one element in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        self.scalar().size() * self.lanes()
    }

    pub(crate) fn decode_u8(self, lanes: &[u8]) -> Vec4 {
        let normalized = matches!(self, Self::U8Nx2 | Self::U8Nx4);
        widen(lanes.iter().map(|&v| {
            if normalized {
                unorm(u32::from(v), 8)
            } else {
                f32::from(v)
            }
        }))
    }

    pub(crate) fn decode_u16(self, lanes: &[u16]) -> Vec4 {
        widen(lanes.iter().map(|&v| match self {
            Self::U16Nx2 | Self::U16Nx4 => unorm(u32::from(v), 16),
            Self::I16Nx2 | Self::I16Nx4 => snorm(u32::from(v), 16),
            _ => f32::from(v),
        }))
    }

    pub(crate) fn decode_u32(self, value: u32) -> Vec4 {
        match self {
            Self::HenD3 => Vec4::new(
                snorm(value & 0x7FF, 11),
                snorm((value >> 11) & 0x7FF, 11),
                snorm(value >> 22, 10),
                0.0,
            ),
            Self::DHen3 => Vec4::new(
                snorm(value & 0x3FF, 10),
                snorm((value >> 10) & 0x7FF, 11),
                snorm(value >> 21, 11),
                0.0,
            ),
            Self::Dec4 => Vec4::new(
                snorm(value & 0x3FF, 10),
                snorm((value >> 10) & 0x3FF, 10),
                snorm((value >> 20) & 0x3FF, 10),
                snorm(value >> 30, 2),
            ),
            Self::UDec4 => Vec4::new(
                unorm(value & 0x3FF, 10),
                unorm((value >> 10) & 0x3FF, 10),
                unorm((value >> 20) & 0x3FF, 10),
                unorm(value >> 30, 2),
            ),
            _ => Vec4::new(value as f32, 0.0, 0.0, 0.0),
        }
    }

    pub(crate) fn decode_f32(lanes: &[f32]) -> Vec4 {
        widen(lanes.iter().copied())
    }
}

fn widen(values: impl Iterator<Item = f32>) -> Vec4 {
    let mut out = [0.0; 4];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = value;
    }
    Vec4::from_array(out)
}

/// Unsigned normalized `bits`-wide value to `[0, 1]`.
fn unorm(value: u32, bits: u32) -> f32 {
    value as f32 / ((1u32 << bits) - 1) as f32
}

/// Signed normalized `bits`-wide two's complement value to `[-1, 1]`.
fn snorm(value: u32, bits: u32) -> f32 {
    let shift = 32 - bits;
    let signed = ((value << shift) as i32) >> shift;
    let max = ((1u32 << (bits - 1)) - 1) as f32;
    (signed as f32 / max).max(-1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_cover_all_lanes() {
        assert_eq!(ElementType::F32x3.size(), 12);
        assert_eq!(ElementType::U8Nx2.size(), 2);
        assert_eq!(ElementType::I16Nx4.size(), 8);
        assert_eq!(ElementType::HenD3.size(), 4);
    }

    #[test]
    fn normalized_lanes_hit_their_extremes() {
        assert_eq!(
            ElementType::U8Nx2.decode_u8(&[0, 255]),
            Vec4::new(0.0, 1.0, 0.0, 0.0)
        );
        assert_eq!(
            ElementType::I16Nx2.decode_u16(&[0x7FFF, 0x8000]),
            Vec4::new(1.0, -1.0, 0.0, 0.0)
        );
        assert_eq!(
            ElementType::U16x2.decode_u16(&[7, 9]),
            Vec4::new(7.0, 9.0, 0.0, 0.0)
        );
    }

    #[test]
    fn packed_vectors_unpack_per_axis() {
        // x = +max (0x3FF), y = -max (0x401), z = 0
        let packed = 0x3FF | (0x401 << 11);
        let v = ElementType::HenD3.decode_u32(packed);
        assert_eq!(v, Vec4::new(1.0, -1.0, 0.0, 0.0));

        let v = ElementType::UDec4.decode_u32(u32::MAX);
        assert_eq!(v, Vec4::ONE);
    }

    #[test]
    fn element_names_deserialize() {
        let parsed: Vec<ElementType> =
            serde_json::from_str(r#"["f32x3", "u8nx4", "hend3", "i16nx2"]"#).unwrap();
        assert_eq!(
            parsed,
            [
                ElementType::F32x3,
                ElementType::U8Nx4,
                ElementType::HenD3,
                ElementType::I16Nx2
            ]
        );
    }
}
