//! Typed tag records consumed by the extraction pipeline.
//!
//! These are produced by the cache's version-aware deserializer; field
//! layouts are already resolved by the time they reach this crate.

use cachegeo_decode::ResourceFixup;
use glam::{Mat4, Vec4};

/// Identifier of a tag within the cache's tag index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagId(pub i32);

/// A resolved reference to another tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagReference {
    pub id: TagId,
    pub file_name: String,
}

/// Identifier of a resource in the resource gestalt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResourceId(pub u32);

impl ResourceId {
    /// Index into the gestalt's resource entries (low 16 bits).
    #[must_use]
    pub fn index(self) -> usize {
        (self.0 & 0xFFFF) as usize
    }
}

/// Which data page of a resource to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PageType {
    #[default]
    Auto,
    Primary,
    Secondary,
}

/// One entry of the resource gestalt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceEntry {
    /// Offset of this resource's fixup region within the fixup data.
    pub fixup_offset: u32,
    /// Size of this resource's fixup blob.
    pub fixup_size: u32,
    /// Raw fixup offsets; the first locates the buffer descriptor tables.
    pub fixup_offsets: Vec<u32>,
    /// Per-buffer fixups, two slots per vertex buffer then index buffers.
    pub resource_fixups: Vec<ResourceFixup>,
}

/// The global table of shared resource blobs (the cache's `zone` tag).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceGestalt {
    /// Compact pointer to the fixup data shared by all entries.
    pub fixup_data_pointer: i32,
    pub entries: Vec<ResourceEntry>,
}

/// A render model's reference to a shader.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderBlock {
    /// `None` when the referenced tag is missing from the cache.
    pub shader: Option<TagReference>,
}

/// Shader tag metadata relevant to materials.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shader {
    pub properties: Vec<ShaderProperties>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderProperties {
    pub maps: Vec<ShaderMap>,
    pub tiling_data: Vec<Vec4>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderMap {
    /// `None` when the referenced bitmap is missing from the cache.
    pub bitmap: Option<TagReference>,
    pub tiling_index: u8,
}

/// A geometry partition sharing one vertex/index buffer pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Section {
    pub submeshes: Vec<Submesh>,
    pub subsets: Vec<Subset>,
    pub vertex_buffer_index: i16,
    /// Undocumented; carried through untouched.
    pub reserved_index: i16,
    pub index_buffer_index: i16,
    pub transparent_nodes_per_vertex: u8,
    pub node_index: u8,
    pub vertex_format: u8,
    pub opaque_nodes_per_vertex: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Submesh {
    pub shader_index: i16,
    pub index_start: u32,
    pub index_length: u32,
    pub subset_index: u16,
    pub subset_count: u16,
    pub vertex_count: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Subset {
    pub index_start: u32,
    pub index_length: u32,
    pub submesh_index: u16,
    pub vertex_count: u16,
}

/// Per-section table mapping local node indices to global ones.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeMap {
    pub indices: Vec<u8>,
}

/// A placement of shared instanced geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryInstance {
    pub name: String,
    pub node_index: i32,
    pub transform_scale: f32,
    pub transform: Mat4,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegionBlock {
    pub name: String,
    pub permutations: Vec<PermutationBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermutationBlock {
    pub name: String,
    pub section_index: i16,
    pub section_count: i16,
}

/// Real-valued `[min, max]` range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RealBounds {
    pub min: f32,
    pub max: f32,
}

impl RealBounds {
    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn length(self) -> f32 {
        self.max - self.min
    }

    /// Map a normalized value into the range.
    #[must_use]
    pub fn expand(self, value: f32) -> f32 {
        self.min + value * self.length()
    }
}

/// Compression bounds for normalized position and texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompressionBounds {
    pub x: RealBounds,
    pub y: RealBounds,
    pub z: RealBounds,
    pub u: RealBounds,
    pub v: RealBounds,
}

/// A render model tag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderModel {
    pub name: String,
    /// Whether blend indices are local to each section's node map.
    pub use_local_nodes: bool,
    pub regions: Vec<RegionBlock>,
    /// Section holding all instanced geometry, or negative for none.
    pub instanced_geometry_section_index: i32,
    pub geometry_instances: Vec<GeometryInstance>,
    pub shaders: Vec<ShaderBlock>,
    pub sections: Vec<Section>,
    pub bounding_boxes: Vec<CompressionBounds>,
    pub node_maps: Vec<NodeMap>,
    pub resource: ResourceId,
}


/// A structure BSP cluster, drawing one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cluster {
    pub section_index: i16,
}

/// A structure BSP tag, with its lightmap geometry already resolved.
///
/// `sections` and `resource` come from the BSP's lightmap data; instance
/// placements other than their names live in `instances_resource`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructureBsp {
    pub name: String,
    pub clusters: Vec<Cluster>,
    pub shaders: Vec<ShaderBlock>,
    pub sections: Vec<Section>,
    /// Per-section compression bounds.
    pub bounding_boxes: Vec<CompressionBounds>,
    pub geometry_instance_names: Vec<String>,
    pub resource: ResourceId,
    pub instances_resource: ResourceId,
}
