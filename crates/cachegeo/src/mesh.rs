//! Extracted meshes and materials.

use std::sync::Arc;

use cachegeo_decode::{DecodeResult, IndexBuffer, VertexBuffer};
use glam::{Vec2, Vec3};

use crate::tags::{CompressionBounds, TagId};

/// What a texture contributes to a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureUsage {
    Diffuse,
    DiffuseDetail,
    Normal,
    NormalDetail,
}

impl TextureUsage {
    /// Classify a bitmap by its file name. The first matching rule wins.
    #[must_use]
    pub fn classify(name: &str) -> Option<Self> {
        if name.ends_with("_detail_normal") || name.ends_with("_detail_bump") {
            Some(Self::NormalDetail)
        } else if name.ends_with("_detail") {
            Some(Self::DiffuseDetail)
        } else if name.ends_with("_normal") || name.ends_with("_bump") {
            Some(Self::Normal)
        } else if name.ends_with("_diff")
            || name.ends_with("_color")
            || name.starts_with("watersurface_")
        {
            Some(Self::Diffuse)
        } else {
            None
        }
    }
}

/// A texture handle. Pixel data is decoded elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub id: TagId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureMapping {
    pub usage: TextureUsage,
    pub tiling: Vec2,
    pub texture: Texture,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: TagId,
    pub name: String,
    pub texture_mappings: Vec<TextureMapping>,
}

/// A range of a mesh's index buffer drawn with one material.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSegment {
    pub material: Option<Arc<Material>>,
    pub index_start: u32,
    pub index_length: u32,
}

/// One section's geometry.
///
/// Buffers are shared between every mesh built from the same buffer index
/// within one extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Node the whole mesh is bound to, if any.
    pub node_index: Option<u8>,
    pub vertex_buffer: Arc<VertexBuffer>,
    pub index_buffer: Arc<IndexBuffer>,
    pub segments: Vec<MeshSegment>,
    pub bounds: Option<CompressionBounds>,
}

impl Mesh {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_buffer.len()
    }

    #[must_use]
    pub fn index_count(&self) -> usize {
        self.index_buffer.len()
    }

    /// A segment's range as a plain triangle list.
    pub fn triangle_indices(&self, segment: &MeshSegment) -> DecodeResult<Vec<u32>> {
        self.index_buffer.triangle_list(
            segment.index_start as usize,
            segment.index_length as usize,
        )
    }

    /// Positions expanded through the compression bounds, when present.
    #[must_use]
    pub fn decompressed_positions(&self) -> Option<Vec<Vec3>> {
        let positions = self.vertex_buffer.positions()?;
        Some(match self.bounds {
            Some(b) => positions
                .into_iter()
                .map(|p| Vec3::new(b.x.expand(p.x), b.y.expand(p.y), b.z.expand(p.z)))
                .collect(),
            None => positions,
        })
    }

    /// Texture coordinates expanded through the compression bounds, when
    /// present.
    #[must_use]
    pub fn decompressed_texcoords(&self) -> Option<Vec<Vec2>> {
        let texcoords = self.vertex_buffer.texcoords()?;
        Some(match self.bounds {
            Some(b) => texcoords
                .into_iter()
                .map(|t| Vec2::new(b.u.expand(t.x), b.v.expand(t.y)))
                .collect(),
            None => texcoords,
        })
    }
}
