//! Synthetic geometry resources for driving the pipeline end to end.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use cachegeo::tags::{ResourceEntry, ResourceGestalt, Section, ShaderBlock, Submesh};
use cachegeo::{CacheProfile, MemoryCache, Platform, ResourceId, TagId, TagReference};
use cachegeo_decode::{
    ByteOrder, ChannelLayout, ChannelUsage, DecodeResult, ElementType, IndexFormat, ResourceFixup,
    ScaledPointerCodec, VertexBuffer, VertexBufferBuilder, VertexFormat, VertexFormatTable,
};
use glam::{Mat4, Vec3};

/// Vertex format used by every fixture buffer: an `f32x3` position followed
/// by `u8x4` blend indices.
pub const FORMAT_ID: u16 = 0;
pub const STRIDE: usize = 16;

pub const RESOURCE: ResourceId = ResourceId(0xE1A0_0000);
/// Second gestalt entry, holding the placement table when one is added.
pub const INSTANCES_RESOURCE: ResourceId = ResourceId(0xE1A1_0001);

/// Bytes between structure-BSP placement records.
const PLACEMENT_STRIDE: usize = 156;

pub fn format_table() -> VertexFormatTable {
    let mut table = VertexFormatTable::new();
    table
        .insert(
            VertexFormat::new(
                FORMAT_ID,
                STRIDE,
                vec![
                    ChannelLayout::new(ChannelUsage::Position, ElementType::F32x3, 0),
                    ChannelLayout::new(ChannelUsage::BlendIndices, ElementType::U8x4, 12),
                ],
            )
            .unwrap(),
        )
        .unwrap();
    table
}

/// Wraps the format table and counts how often each buffer is decoded.
#[derive(Debug, Default)]
pub struct CountingBuilder {
    pub table: VertexFormatTable,
    calls: AtomicUsize,
}

impl CountingBuilder {
    pub fn new() -> Self {
        Self {
            table: format_table(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VertexBufferBuilder for CountingBuilder {
    fn build_vertex_buffer(
        &self,
        format_id: u16,
        vertex_count: usize,
        data: &[u8],
    ) -> DecodeResult<VertexBuffer> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.table.build_vertex_buffer(format_id, vertex_count, data)
    }
}

/// Vertex bytes for `count` vertices: position `(i, i + 0.5, -i)` and blend
/// indices `[i, 1, 2, 3]`.
pub fn vertex_bytes(count: usize) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(count * STRIDE);
    for i in 0..count {
        let f = i as f32;
        for value in [f, f + 0.5, -f] {
            bytes.extend(value.to_le_bytes());
        }
        bytes.extend([i as u8, 1, 2, 3]);
    }
    bytes
}

pub fn index_bytes(indices: &[u16]) -> Vec<u8> {
    indices.iter().flat_map(|i| i.to_le_bytes()).collect()
}

/// Builder for one cache holding one geometry resource.
#[derive(Debug)]
pub struct ResourceFixture {
    platform: Platform,
    vertex_buffers: Vec<(u32, Vec<u8>)>,
    index_buffers: Vec<(IndexFormat, Vec<u8>)>,
    shaders: Vec<(TagId, String)>,
    placements: Vec<(f32, Vec3, i16)>,
}

impl ResourceFixture {
    pub fn new() -> Self {
        Self {
            platform: Platform::X86,
            vertex_buffers: Vec::new(),
            index_buffers: Vec::new(),
            shaders: Vec::new(),
            placements: Vec::new(),
        }
    }

    #[must_use]
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Add a vertex buffer; `count` is what the descriptor declares.
    #[must_use]
    pub fn vertex_buffer(mut self, count: u32, data: Vec<u8>) -> Self {
        self.vertex_buffers.push((count, data));
        self
    }

    #[must_use]
    pub fn index_buffer(mut self, format: IndexFormat, data: Vec<u8>) -> Self {
        self.index_buffers.push((format, data));
        self
    }

    /// Register a readable shader tag.
    #[must_use]
    pub fn shader(mut self, id: i32, name: &str) -> Self {
        self.shaders.push((TagId(id), name.to_owned()));
        self
    }

    /// Add a structure-BSP instance placement to the instances resource.
    #[must_use]
    pub fn placement(mut self, scale: f32, translation: Vec3, section_index: i16) -> Self {
        self.placements.push((scale, translation, section_index));
        self
    }

    pub fn build(self) -> MemoryCache {
        self.build_with(format_table())
    }

    pub fn build_with(self, formats: VertexFormatTable) -> MemoryCache {
        let order = self.platform.byte_order();
        let profile = CacheProfile::new(ScaledPointerCodec::MCC_HALO4, self.platform, formats);
        let base = profile.pointer_codec().expand(0);

        // Fixup blob: descriptor tables, then the count trailer.
        let vertex_count = self.vertex_buffers.len();
        let mut blob = Vec::new();
        for (count, data) in &self.vertex_buffers {
            blob.extend(descriptor(order, *count, data.len()));
        }
        blob.extend(vec![0xAB; 12 * vertex_count]);
        for (format, data) in &self.index_buffers {
            blob.extend(descriptor(order, *format as u32, data.len()));
        }
        blob.extend(u32_bytes(order, vertex_count as u32));
        blob.extend([0; 8]);
        blob.extend(u32_bytes(order, self.index_buffers.len() as u32));
        blob.extend([0; 8]);

        // Raw data: every vertex buffer, then every index buffer.
        let mut raw = Vec::new();
        let mut fixups = Vec::new();
        for (_, data) in &self.vertex_buffers {
            fixups.push(ResourceFixup(0x4000_0000 | raw.len() as u32));
            raw.extend(data);
        }
        fixups.extend(vec![ResourceFixup(0); vertex_count]);
        for (_, data) in &self.index_buffers {
            fixups.push(ResourceFixup(0x4000_0000 | raw.len() as u32));
            raw.extend(data);
        }

        let mut entries = vec![ResourceEntry {
            fixup_offset: 0,
            fixup_size: blob.len() as u32,
            fixup_offsets: vec![0],
            resource_fixups: fixups,
        }];

        // Placement table after the geometry blob, found through the tenth
        // fixup from the end.
        if !self.placements.is_empty() {
            let table_offset = blob.len() as u32;
            for (scale, translation, section_index) in &self.placements {
                let start = blob.len();
                blob.extend(u32_bytes(order, scale.to_bits()));
                for value in Mat4::from_translation(*translation).to_cols_array() {
                    blob.extend(u32_bytes(order, value.to_bits()));
                }
                blob.extend([0; 6]);
                blob.extend(match order {
                    ByteOrder::Little => section_index.to_le_bytes(),
                    ByteOrder::Big => section_index.to_be_bytes(),
                });
                blob.resize(start + PLACEMENT_STRIDE, 0);
            }
            let mut placement_fixups = vec![ResourceFixup(0); 10];
            placement_fixups[0] = ResourceFixup(0x4000_0000);
            entries.push(ResourceEntry {
                fixup_offset: table_offset,
                fixup_size: 0,
                fixup_offsets: Vec::new(),
                resource_fixups: placement_fixups,
            });
        }

        let mut cache = MemoryCache::new(profile);
        cache.set_resource_gestalt(ResourceGestalt {
            fixup_data_pointer: 0,
            entries,
        });
        cache.set_image(base, blob);
        cache.add_resource(RESOURCE, raw);
        for (id, name) in self.shaders {
            cache.add_shader(id, cachegeo::tags::Shader::default());
            cache.add_texture(cachegeo::Texture { id, name });
        }
        cache
    }
}

fn u32_bytes(order: ByteOrder, value: u32) -> [u8; 4] {
    match order {
        ByteOrder::Little => value.to_le_bytes(),
        ByteOrder::Big => value.to_be_bytes(),
    }
}

/// A 28-byte descriptor with `first` at offset 0 and the data length at 8.
fn descriptor(order: ByteOrder, first: u32, len: usize) -> Vec<u8> {
    let mut record = Vec::with_capacity(28);
    record.extend(u32_bytes(order, first));
    record.extend([0; 4]);
    record.extend(u32_bytes(order, len as u32));
    record.resize(28, 0);
    record
}

pub fn section(vertex_buffer_index: i16, index_buffer_index: i16) -> Section {
    Section {
        submeshes: vec![Submesh {
            shader_index: 0,
            index_start: 0,
            index_length: 3,
            ..Submesh::default()
        }],
        vertex_buffer_index,
        index_buffer_index,
        node_index: cachegeo_decode::UNBOUND_NODE,
        vertex_format: FORMAT_ID as u8,
        ..Section::default()
    }
}

pub fn shader_block(id: i32, name: &str) -> ShaderBlock {
    ShaderBlock {
        shader: Some(TagReference {
            id: TagId(id),
            file_name: name.to_owned(),
        }),
    }
}

/// Route pipeline logs to the test harness output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}
