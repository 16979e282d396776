//! Decode geometry buffers from compiled game asset caches.
//!
//! This crate provides pure synchronous decoding functions for the layered
//! indirection that locates render geometry inside a cache resource: compact
//! pointers, fixup blobs, buffer descriptor tables and raw interleaved buffer
//! bytes. Nothing here performs I/O; callers hand in byte slices and control
//! threading.
//!
//! # Key items
//!
//! - [`PointerCodec`]: Expand and contract compact in-record pointers
//! - [`read_buffer_counts`]: Read buffer counts from a fixup blob trailer
//! - [`BufferDescriptorTable`]: Per-buffer vertex/index metadata
//! - [`AddressResolver`]: Locate each buffer's raw bytes via resource fixups
//! - [`buffer_bytes`]: Bounds-checked view of one buffer's raw bytes
//! - [`VertexBufferBuilder`]: Deinterleave raw vertices per a format template
//! - [`build_index_buffer`]: Decode raw indices at the owning buffer's width
//! - [`normalize_endianness`]: Reverse built buffers for big-endian caches

mod error;

pub mod address;
pub mod descriptors;
pub mod element;
pub mod endian;
pub mod fixup;
pub mod format;
pub mod index;
pub mod vertex;

pub use address::{PointerCodec, ScaledPointerCodec};
pub use descriptors::{BufferDescriptorTable, IndexBufferDescriptor, VertexBufferDescriptor};
pub use element::{ElementType, Scalar};
pub use endian::{ByteOrder, normalize_endianness};
pub use error::{DecodeError, DecodeResult, ErrorKind};
pub use fixup::{AddressResolver, BufferCounts, ResourceFixup, buffer_bytes, read_buffer_counts};
pub use format::{ChannelLayout, ChannelUsage, VertexFormat, VertexFormatTable};
pub use index::{IndexBuffer, IndexFormat, IndexWidth, build_index_buffer};
pub use vertex::{Lanes, VertexBuffer, VertexBufferBuilder, VertexChannel, deinterleave};

/// Node index meaning "not bound to a node".
pub const UNBOUND_NODE: u8 = u8::MAX;
