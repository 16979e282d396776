//! Structure-BSP assembly and instance placements.
//!
//! A structure BSP keeps only instance names in its tag; scale, transform and
//! section index of each instance live in a placement table inside the
//! instances resource's fixup data.

use std::collections::HashMap;
use std::io::Cursor;

use binrw::{BinRead, VecArgs, binread};
use cachegeo_decode::DecodeError;
use cachegeo_decode::fixup::FIXUP_OFFSET_MASK;
use glam::Mat4;

use crate::assemble::{GeometryArgs, MeshAssembler};
use crate::error::{Error, Result};
use crate::model::{GeometryModel, GeometryPermutation, GeometryRegion};
use crate::source::CacheSource;
use crate::tags::{PageType, ResourceId, StructureBsp};

/// Name of the region with one permutation per cluster.
pub const CLUSTERS_REGION: &str = "Clusters";

/// Distance between placement records.
pub const PLACEMENT_STRIDE: usize = 156;

/// Fixup, counted back from the end of the list, that locates the placement
/// table.
const PLACEMENT_FIXUP_FROM_END: usize = 10;

/// One placed instance of BSP geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct BspInstancePlacement {
    pub name: String,
    pub transform_scale: f32,
    pub transform: Mat4,
    /// Section drawn by this instance.
    pub section_index: i16,
}

/// Bytes of a placement record after the section index.
const PLACEMENT_TAIL: i64 = (PLACEMENT_STRIDE - (4 + 64 + 6 + 2)) as i64;

#[binread]
#[derive(Debug, Clone, Copy, PartialEq)]
struct PlacementRecord {
    transform_scale: f32,
    // Row-major with translation in the last row, which is glam's
    // column-major layout for the same transform.
    #[br(map = |m: [f32; 16]| Mat4::from_cols_array(&m))]
    transform: Mat4,
    #[br(pad_before = 6, pad_after = PLACEMENT_TAIL)]
    section_index: i16,
}

/// Read one placement per instance name from the instances resource.
pub fn read_bsp_instance_placements<C: CacheSource + ?Sized>(
    cache: &C,
    resource: ResourceId,
    names: &[String],
) -> Result<Vec<BspInstancePlacement>> {
    let gestalt = cache.resource_gestalt()?;
    let index = resource.index();
    let entry = gestalt
        .entries
        .get(index)
        .ok_or(Error::ResourceIndexOutOfRange {
            index,
            len: gestalt.entries.len(),
        })?;

    let len = entry.resource_fixups.len();
    let fixup = len
        .checked_sub(PLACEMENT_FIXUP_FROM_END)
        .and_then(|slot| entry.resource_fixups.get(slot))
        .ok_or(DecodeError::FixupOutOfRange {
            slot: PLACEMENT_FIXUP_FROM_END,
            len,
        })?;
    let address = (entry.fixup_offset.wrapping_add(fixup.0) & FIXUP_OFFSET_MASK) as usize;

    let mut cursor = Cursor::new(cache.fixup_data()?);
    cursor.set_position(address as u64);
    let records = Vec::<PlacementRecord>::read_options(
        &mut cursor,
        cache.profile().byte_order().endian(),
        VecArgs {
            count: names.len(),
            inner: (),
        },
    )
    .map_err(DecodeError::from)?;

    let placements: Vec<_> = names
        .iter()
        .zip(records)
        .map(|(name, record)| BspInstancePlacement {
            name: name.clone(),
            transform_scale: record.transform_scale,
            transform: record.transform,
            section_index: record.section_index,
        })
        .collect();

    tracing::debug!(
        count = placements.len(),
        address,
        "read bsp instance placements"
    );
    Ok(placements)
}

/// Placements sharing one name.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceGroup<'a> {
    pub name: &'a str,
    pub instances: Vec<&'a BspInstancePlacement>,
}

/// Group placements by exact name, in order of first appearance.
#[must_use]
pub fn group_instances_by_name(placements: &[BspInstancePlacement]) -> Vec<InstanceGroup<'_>> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<InstanceGroup<'_>> = Vec::new();

    for placement in placements {
        let name = placement.name.as_str();
        let position = *positions.entry(name).or_insert_with(|| {
            groups.push(InstanceGroup {
                name,
                instances: Vec::new(),
            });
            groups.len() - 1
        });
        groups[position].instances.push(placement);
    }

    groups
}

/// Assemble a structure BSP's meshes, cluster region and one region per
/// group of same-named instances.
///
/// Each permutation draws a single section. Meshes take the compression
/// bounds at their own section index.
pub fn build_bsp_geometry<C: CacheSource + ?Sized>(
    cache: &C,
    bsp: &StructureBsp,
) -> Result<GeometryModel> {
    let mut regions = vec![GeometryRegion {
        source_index: None,
        name: CLUSTERS_REGION.to_owned(),
        permutations: bsp
            .clusters
            .iter()
            .enumerate()
            .filter_map(|(i, cluster)| {
                Some(GeometryPermutation {
                    source_index: i,
                    name: format!("{i:03}"),
                    mesh_index: usize::try_from(cluster.section_index).ok()?,
                    mesh_count: 1,
                    transform_scale: 1.0,
                    transform: Mat4::IDENTITY,
                    instanced: false,
                })
            })
            .collect(),
    }];

    if !bsp.geometry_instance_names.is_empty() {
        let placements = read_bsp_instance_placements(
            cache,
            bsp.instances_resource,
            &bsp.geometry_instance_names,
        )?;
        for group in group_instances_by_name(&placements) {
            regions.push(GeometryRegion {
                source_index: None,
                name: group.name.to_owned(),
                permutations: group
                    .instances
                    .iter()
                    .enumerate()
                    .filter_map(|(i, placement)| {
                        Some(GeometryPermutation {
                            source_index: i,
                            name: placement.name.clone(),
                            mesh_index: usize::try_from(placement.section_index).ok()?,
                            mesh_count: 1,
                            transform_scale: placement.transform_scale,
                            transform: placement.transform,
                            instanced: true,
                        })
                    })
                    .collect(),
            });
        }
    }
    regions.retain(|region| !region.permutations.is_empty());

    let extracted = MeshAssembler::new(cache).extract(&GeometryArgs {
        shaders: &bsp.shaders,
        sections: &bsp.sections,
        node_maps: None,
        resource: bsp.resource,
        page: PageType::Auto,
    })?;

    let mut meshes = extracted.meshes;
    for (mesh, bounds) in meshes.iter_mut().zip(&bsp.bounding_boxes) {
        if let Some(mesh) = mesh {
            mesh.bounds = Some(*bounds);
        }
    }

    tracing::debug!(
        name = %bsp.name,
        regions = regions.len(),
        meshes = meshes.len(),
        "assembled structure bsp"
    );
    Ok(GeometryModel {
        name: bsp.name.clone(),
        regions,
        meshes,
        materials: extracted.materials,
        bounds: bsp.bounding_boxes.clone(),
        skipped_maps: extracted.skipped_maps,
    })
}
