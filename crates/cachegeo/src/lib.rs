//! Extract render geometry from compiled game asset caches.
//!
//! This crate drives the decoding primitives of [`cachegeo_decode`] over a
//! cache's tag records and resource data: it resolves a geometry resource,
//! decodes every referenced buffer once, and assembles meshes and materials
//! for render models and structure BSPs.
//!
//! Access to the cache itself goes through the [`CacheSource`] trait; the
//! crate never opens files or threads. Each extraction call is
//! self-contained, so different tags may be extracted concurrently with one
//! source per thread.
//!
//! # Key items
//!
//! - [`MeshAssembler`]: Build one mesh per section of a geometry resource
//! - [`resolve_materials`]: Build materials from shader references
//! - [`split_instances`]: Split shared instanced geometry into meshes
//! - [`build_geometry_model`]: Assemble a render model's regions and meshes
//! - [`build_bsp_geometry`]: Assemble a structure BSP's regions and meshes
//! - [`read_bsp_instance_placements`]: Read structure-BSP instance placements
//! - [`MemoryCache`]: An in-memory [`CacheSource`]

pub mod assemble;
pub mod bsp;
mod error;
pub mod instance;
pub mod material;
pub mod memory;
pub mod mesh;
pub mod model;
pub mod source;
pub mod tags;

pub use assemble::{ExtractedGeometry, GeometryArgs, MeshAssembler};
pub use bsp::{
    BspInstancePlacement, CLUSTERS_REGION, InstanceGroup, build_bsp_geometry,
    group_instances_by_name, read_bsp_instance_placements,
};
pub use cachegeo_decode::ErrorKind;
pub use error::{Error, Result};
pub use instance::{InstancePlacement, split_instances};
pub use material::{MapOutcome, ResolvedMaterials, SkipReason, SkippedMap, resolve_materials};
pub use memory::MemoryCache;
pub use mesh::{Material, Mesh, MeshSegment, Texture, TextureMapping, TextureUsage};
pub use model::{GeometryModel, GeometryPermutation, GeometryRegion, build_geometry_model};
pub use source::{CacheProfile, CacheSource, Platform};
pub use tags::{PageType, RenderModel, ResourceId, StructureBsp, TagId, TagReference};
