//! Render-model assembly.

use std::sync::Arc;

use glam::Mat4;

use crate::assemble::{GeometryArgs, MeshAssembler};
use crate::error::{Error, Result};
use crate::instance::split_instances;
use crate::material::SkippedMap;
use crate::mesh::{Material, Mesh};
use crate::source::CacheSource;
use crate::tags::{CompressionBounds, PageType, RenderModel};

/// Name of the region holding split geometry instances.
pub const INSTANCES_REGION: &str = "Instances";

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryPermutation {
    /// Index of the permutation (or instance) this was built from.
    pub source_index: usize,
    pub name: String,
    pub mesh_index: usize,
    pub mesh_count: usize,
    pub transform_scale: f32,
    pub transform: Mat4,
    /// Whether the mesh is shared geometry placed by `transform`.
    pub instanced: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRegion {
    /// `None` for regions synthesized during assembly.
    pub source_index: Option<usize>,
    pub name: String,
    pub permutations: Vec<GeometryPermutation>,
}

/// A render model's geometry, ready for export.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryModel {
    pub name: String,
    pub regions: Vec<GeometryRegion>,
    pub meshes: Vec<Option<Mesh>>,
    pub materials: Vec<Option<Arc<Material>>>,
    pub bounds: Vec<CompressionBounds>,
    pub skipped_maps: Vec<SkippedMap>,
}

/// Assemble a render model's regions, meshes and materials.
///
/// Node maps apply only when the model uses local nodes. When the model has
/// an instanced section it is split into per-instance meshes and an
/// [`INSTANCES_REGION`] region is appended.
pub fn build_geometry_model<C: CacheSource + ?Sized>(
    cache: &C,
    model: &RenderModel,
) -> Result<GeometryModel> {
    if model.sections.iter().all(|s| s.index_buffer_index < 0) {
        return Err(Error::NoEdges);
    }

    let mut regions: Vec<GeometryRegion> = model
        .regions
        .iter()
        .enumerate()
        .map(|(region_index, region)| GeometryRegion {
            source_index: Some(region_index),
            name: region.name.clone(),
            permutations: region
                .permutations
                .iter()
                .enumerate()
                .filter_map(|(i, p)| {
                    let mesh_index = usize::try_from(p.section_index).ok()?;
                    Some(GeometryPermutation {
                        source_index: i,
                        name: p.name.clone(),
                        mesh_index,
                        mesh_count: 1,
                        transform_scale: 1.0,
                        transform: Mat4::IDENTITY,
                        instanced: false,
                    })
                })
                .collect(),
        })
        .filter(|region| !region.permutations.is_empty())
        .collect();

    let extracted = MeshAssembler::new(cache).extract(&GeometryArgs {
        shaders: &model.shaders,
        sections: &model.sections,
        node_maps: model.use_local_nodes.then_some(model.node_maps.as_slice()),
        resource: model.resource,
        page: PageType::Auto,
    })?;

    let mut meshes = extracted.meshes;
    let bounds = model.bounding_boxes.first().copied();
    for mesh in meshes.iter_mut().flatten() {
        mesh.bounds = bounds;
    }

    if let Ok(section_index) = usize::try_from(model.instanced_geometry_section_index) {
        let section = model
            .sections
            .get(section_index)
            .ok_or(Error::InstancedSectionMissing(section_index))?;
        let placements = split_instances(
            &mut meshes,
            &extracted.materials,
            section_index,
            section,
            &model.geometry_instances,
        )?;

        renumber_after_split(&mut regions, section_index, placements.len());
        regions.push(GeometryRegion {
            source_index: None,
            name: INSTANCES_REGION.to_owned(),
            permutations: placements
                .into_iter()
                .enumerate()
                .map(|(i, placement)| GeometryPermutation {
                    source_index: i,
                    name: placement.name,
                    mesh_index: placement.mesh_index,
                    mesh_count: 1,
                    transform_scale: placement.transform_scale,
                    transform: placement.transform,
                    instanced: true,
                })
                .collect(),
        });
    }

    Ok(GeometryModel {
        name: model.name.clone(),
        regions,
        meshes,
        materials: extracted.materials,
        bounds: model.bounding_boxes.clone(),
        skipped_maps: extracted.skipped_maps,
    })
}

/// Fix up permutation mesh indices after the mesh at `section_index` was
/// replaced by `instance_count` meshes.
///
/// Permutations drawing the replaced mesh itself are dropped, along with
/// regions left empty.
fn renumber_after_split(
    regions: &mut Vec<GeometryRegion>,
    section_index: usize,
    instance_count: usize,
) {
    for region in regions.iter_mut() {
        region.permutations.retain(|p| p.mesh_index != section_index);
        for permutation in &mut region.permutations {
            if permutation.mesh_index > section_index {
                permutation.mesh_index = permutation.mesh_index + instance_count - 1;
            }
        }
    }
    regions.retain(|region| !region.permutations.is_empty());
}
