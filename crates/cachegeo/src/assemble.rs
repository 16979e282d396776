//! Mesh assembly for one geometry resource.
//!
//! Extraction resolves the resource entry, reads the descriptor tables from
//! the fixup blob, decodes every referenced buffer once, and then builds one
//! mesh slot per section. All buffer state lives in a per-call arena; nothing
//! survives between calls.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use cachegeo_decode::{
    AddressResolver, BufferDescriptorTable, ChannelUsage, IndexBuffer, IndexFormat, Lanes,
    UNBOUND_NODE, VertexBuffer, VertexBufferBuilder, VertexChannel, buffer_bytes,
    build_index_buffer, normalize_endianness, read_buffer_counts,
};

use crate::error::{Error, Result};
use crate::material::{ResolvedMaterials, SkippedMap, resolve_materials};
use crate::mesh::{Material, Mesh, MeshSegment};
use crate::source::CacheSource;
use crate::tags::{NodeMap, PageType, ResourceEntry, ResourceId, Section, ShaderBlock};

/// Inputs for one extraction call.
#[derive(Debug, Clone, Copy)]
pub struct GeometryArgs<'a> {
    pub shaders: &'a [ShaderBlock],
    pub sections: &'a [Section],
    /// Local-to-global node maps, one per section. `None` leaves blend
    /// indices untouched.
    pub node_maps: Option<&'a [NodeMap]>,
    pub resource: ResourceId,
    pub page: PageType,
}

/// Output of one extraction call.
#[derive(Debug, Clone, Default)]
pub struct ExtractedGeometry {
    /// One slot per section; `None` for sections without geometry.
    pub meshes: Vec<Option<Mesh>>,
    /// One slot per shader block; `None` for unresolved shaders.
    pub materials: Vec<Option<Arc<Material>>>,
    /// Shader maps dropped while building materials.
    pub skipped_maps: Vec<SkippedMap>,
}

/// Builds meshes for a cache, one resource at a time.
pub struct MeshAssembler<'a, C: CacheSource + ?Sized> {
    cache: &'a C,
    vertex_builder: &'a dyn VertexBufferBuilder,
}

impl<'a, C: CacheSource + ?Sized> MeshAssembler<'a, C> {
    /// Assemble with the cache profile's vertex formats.
    pub fn new(cache: &'a C) -> Self {
        Self {
            cache,
            vertex_builder: cache.profile().vertex_formats(),
        }
    }

    /// Decode vertex buffers with a different builder.
    #[must_use]
    pub fn with_vertex_builder(mut self, vertex_builder: &'a dyn VertexBufferBuilder) -> Self {
        self.vertex_builder = vertex_builder;
        self
    }

    /// Extract every section's mesh and the material list.
    pub fn extract(&self, args: &GeometryArgs<'_>) -> Result<ExtractedGeometry> {
        let gestalt = self.cache.resource_gestalt()?;
        let index = args.resource.index();
        let entry = gestalt
            .entries
            .get(index)
            .ok_or(Error::ResourceIndexOutOfRange {
                index,
                len: gestalt.entries.len(),
            })?;

        let table = self.read_descriptor_table(entry)?;
        let mut arena = self.build_buffers(args, entry, &table)?;

        if normalize_endianness(
            self.cache.profile().byte_order(),
            arena.vertex.values_mut(),
            arena.index.values_mut(),
        ) {
            tracing::debug!(
                vertex_buffers = arena.vertex.len(),
                index_buffers = arena.index.len(),
                "reversed buffer byte order"
            );
        }

        if let Some(node_maps) = args.node_maps {
            arena.remap_node_indices(args.sections, node_maps);
        }

        let ResolvedMaterials { materials, skipped } = resolve_materials(self.cache, args.shaders);
        let (vertex, index) = arena.freeze();

        let meshes = args
            .sections
            .iter()
            .enumerate()
            .map(|(section_index, section)| {
                let mesh = build_mesh(section, &vertex, &index, &materials);
                if mesh.is_none() {
                    tracing::debug!(section_index, "section has no geometry");
                }
                mesh
            })
            .collect();

        Ok(ExtractedGeometry {
            meshes,
            materials,
            skipped_maps: skipped,
        })
    }

    fn read_descriptor_table(&self, entry: &ResourceEntry) -> Result<BufferDescriptorTable> {
        let data = self.cache.fixup_data()?;
        let order = self.cache.profile().byte_order();
        let fixup_offset = entry.fixup_offsets.first().copied().unwrap_or_default() as usize;

        let counts = read_buffer_counts(data, order, fixup_offset, entry.fixup_size as usize)?;
        tracing::debug!(
            vertex_buffers = counts.vertex_buffers,
            index_buffers = counts.index_buffers,
            "read buffer counts"
        );

        Ok(BufferDescriptorTable::read_from(
            data,
            order,
            fixup_offset,
            counts,
        )?)
    }

    fn build_buffers(
        &self,
        args: &GeometryArgs<'_>,
        entry: &ResourceEntry,
        table: &BufferDescriptorTable,
    ) -> Result<BufferArena> {
        let data = self.cache.resource_data(args.resource, args.page)?;
        let resolver = AddressResolver::new(&entry.resource_fixups, table.vertex_buffers.len());
        let mut arena = BufferArena::default();

        for (section_index, section) in args.sections.iter().enumerate() {
            let vertex_info = table
                .vertex_buffer(section.vertex_buffer_index)
                .copied()
                .unwrap_or_default();
            let index_info = table
                .index_buffer(section.index_buffer_index)
                .copied()
                .unwrap_or_default();

            if vertex_info.vertex_count == 0 || index_info.data_length == 0 {
                tracing::debug!(section_index, "skipping degenerate section");
                continue;
            }

            // Both buffer indices resolved to descriptors, so neither is negative.
            let vertex_count = vertex_info.vertex_count as usize;

            if let Entry::Vacant(slot) = arena.vertex.entry(section.vertex_buffer_index) {
                let offset = resolver.vertex_buffer_offset(section.vertex_buffer_index as usize)?;
                let bytes = buffer_bytes(&data, offset, vertex_info.data_length as usize)?;
                let buffer = self.vertex_builder.build_vertex_buffer(
                    u16::from(section.vertex_format),
                    vertex_count,
                    bytes,
                )?;
                tracing::trace!(
                    index = section.vertex_buffer_index,
                    vertex_count,
                    offset,
                    "built vertex buffer"
                );
                slot.insert(buffer);
            }

            if let Entry::Vacant(slot) = arena.index.entry(section.index_buffer_index) {
                let offset = resolver.index_buffer_offset(section.index_buffer_index as usize)?;
                let bytes = buffer_bytes(&data, offset, index_info.data_length as usize)?;
                let format = IndexFormat::try_from(index_info.index_format)?;
                let buffer = build_index_buffer(bytes, vertex_count, format)?;
                tracing::trace!(
                    index = section.index_buffer_index,
                    index_count = buffer.len(),
                    offset,
                    "built index buffer"
                );
                slot.insert(buffer);
            }
        }

        Ok(arena)
    }
}

/// Buffers decoded during one extraction, keyed by buffer index.
#[derive(Debug, Default)]
struct BufferArena {
    vertex: BTreeMap<i16, VertexBuffer>,
    index: BTreeMap<i16, IndexBuffer>,
}

type SharedBuffers<T> = BTreeMap<i16, Arc<T>>;

impl BufferArena {
    /// Map blend indices through node maps, once per vertex buffer, using the
    /// map of the first section that draws from it.
    fn remap_node_indices(&mut self, sections: &[Section], node_maps: &[NodeMap]) {
        let mut remapped = BTreeSet::new();
        for (section_index, section) in sections.iter().enumerate() {
            if !self.index.contains_key(&section.index_buffer_index) {
                continue;
            }
            let Some(buffer) = self.vertex.get_mut(&section.vertex_buffer_index) else {
                continue;
            };
            if !remapped.insert(section.vertex_buffer_index) {
                continue;
            }
            let Some(map) = node_maps.get(section_index) else {
                continue;
            };
            for channel in buffer.channels_mut(ChannelUsage::BlendIndices) {
                remap_channel(channel, &map.indices);
            }
        }
    }

    fn freeze(self) -> (SharedBuffers<VertexBuffer>, SharedBuffers<IndexBuffer>) {
        let vertex = self
            .vertex
            .into_iter()
            .map(|(k, v)| (k, Arc::new(v)))
            .collect();
        let index = self
            .index
            .into_iter()
            .map(|(k, v)| (k, Arc::new(v)))
            .collect();
        (vertex, index)
    }
}

/// Replace each local node index with its global index. Indices missing from
/// the map pass through unchanged.
fn remap_channel(channel: &mut VertexChannel, map: &[u8]) {
    match channel.lanes_mut() {
        Lanes::U8(lanes) => {
            for lane in lanes {
                if let Some(&global) = map.get(usize::from(*lane)) {
                    *lane = global;
                }
            }
        }
        Lanes::U16(lanes) => {
            for lane in lanes {
                if let Some(&global) = map.get(usize::from(*lane)) {
                    *lane = u16::from(global);
                }
            }
        }
        Lanes::U32(lanes) => {
            for lane in lanes {
                if let Some(&global) = map.get(*lane as usize) {
                    *lane = u32::from(global);
                }
            }
        }
        Lanes::F32(_) => {
            tracing::warn!("float blend indices cannot be remapped");
        }
    }
}

fn build_mesh(
    section: &Section,
    vertex: &SharedBuffers<VertexBuffer>,
    index: &SharedBuffers<IndexBuffer>,
    materials: &[Option<Arc<Material>>],
) -> Option<Mesh> {
    let vertex_buffer = vertex.get(&section.vertex_buffer_index)?;
    let index_buffer = index.get(&section.index_buffer_index)?;

    let segments = section
        .submeshes
        .iter()
        .map(|submesh| MeshSegment {
            material: material_at(materials, submesh.shader_index),
            index_start: submesh.index_start,
            index_length: submesh.index_length,
        })
        .collect();

    Some(Mesh {
        node_index: (section.node_index != UNBOUND_NODE).then_some(section.node_index),
        vertex_buffer: Arc::clone(vertex_buffer),
        index_buffer: Arc::clone(index_buffer),
        segments,
        bounds: None,
    })
}

/// Material at a shader index; out-of-range indices yield `None`.
pub(crate) fn material_at(
    materials: &[Option<Arc<Material>>],
    shader_index: i16,
) -> Option<Arc<Material>> {
    usize::try_from(shader_index)
        .ok()
        .and_then(|i| materials.get(i))
        .cloned()
        .flatten()
}
