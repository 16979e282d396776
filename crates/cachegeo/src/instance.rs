//! Splitting shared instanced geometry into per-instance meshes.
//!
//! A render model may store every geometry instance in one section, with one
//! subset per instance. Each instance becomes its own mesh with a private,
//! rebased index buffer and a sliced vertex buffer.

use std::sync::Arc;

use cachegeo_decode::{IndexBuffer, IndexWidth, UNBOUND_NODE};
use glam::Mat4;

use crate::assemble::material_at;
use crate::error::{Error, Result};
use crate::mesh::{Material, Mesh, MeshSegment};
use crate::tags::{GeometryInstance, Section};

/// Where one split instance ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct InstancePlacement {
    pub name: String,
    pub transform_scale: f32,
    pub transform: Mat4,
    /// Index of the instance's mesh in the spliced mesh list.
    pub mesh_index: usize,
}

/// Replace the mesh at `section_index` with one mesh per instance.
///
/// Instance meshes are spliced in at the source slot, in instance order, so
/// meshes after it shift by `instances.len() - 1`.
pub fn split_instances(
    meshes: &mut Vec<Option<Mesh>>,
    materials: &[Option<Arc<Material>>],
    section_index: usize,
    section: &Section,
    instances: &[GeometryInstance],
) -> Result<Vec<InstancePlacement>> {
    let source = meshes
        .get(section_index)
        .and_then(Option::as_ref)
        .ok_or(Error::InstancedSectionMissing(section_index))?;

    let mut split = Vec::with_capacity(instances.len());
    let mut placements = Vec::with_capacity(instances.len());

    for (i, instance) in instances.iter().enumerate() {
        let subset = section
            .subsets
            .get(i)
            .ok_or(Error::InstanceSubsetMissing {
                instance: i,
                subsets: section.subsets.len(),
            })?;

        let strip = source
            .index_buffer
            .subset(subset.index_start as usize, subset.index_length as usize)?;
        let (vertex_buffer, index_buffer) = match (strip.iter().min(), strip.iter().max()) {
            (Some(&min), Some(&max)) => {
                let count = (max - min) as usize + 1;
                let rebased = strip.iter().map(|&j| j - min).collect();
                (
                    source.vertex_buffer.slice(min as usize, count)?,
                    IndexBuffer::from_indices(
                        rebased,
                        IndexWidth::for_vertex_count(count),
                        source.index_buffer.format(),
                    ),
                )
            }
            _ => (
                source.vertex_buffer.slice(0, 0)?,
                IndexBuffer::from_indices(
                    Vec::new(),
                    IndexWidth::U16,
                    source.index_buffer.format(),
                ),
            ),
        };

        let material = section
            .submeshes
            .get(usize::from(subset.submesh_index))
            .and_then(|submesh| material_at(materials, submesh.shader_index));

        split.push(Mesh {
            node_index: u8::try_from(instance.node_index)
                .ok()
                .filter(|&n| n != UNBOUND_NODE),
            segments: vec![MeshSegment {
                material,
                index_start: 0,
                index_length: index_buffer.len() as u32,
            }],
            vertex_buffer: Arc::new(vertex_buffer),
            index_buffer: Arc::new(index_buffer),
            bounds: source.bounds,
        });
        placements.push(InstancePlacement {
            name: instance.name.clone(),
            transform_scale: instance.transform_scale,
            transform: instance.transform,
            mesh_index: section_index + i,
        });
    }

    tracing::debug!(
        section_index,
        instances = split.len(),
        "split instanced geometry"
    );
    meshes.splice(section_index..=section_index, split.into_iter().map(Some));
    Ok(placements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{Submesh, Subset};
    use cachegeo_decode::{
        ChannelLayout, ChannelUsage, ElementType, IndexFormat, VertexFormat, deinterleave,
    };
    use glam::Vec3;
    use proptest::prelude::*;

    fn source_mesh(vertex_count: usize, indices: Vec<u32>) -> Mesh {
        let format = VertexFormat::new(
            0,
            12,
            vec![ChannelLayout::new(ChannelUsage::Position, ElementType::F32x3, 0)],
        )
        .unwrap();
        let data: Vec<u8> = (0..vertex_count)
            .flat_map(|i| [i as f32, 0.0, 0.0])
            .flat_map(f32::to_le_bytes)
            .collect();
        Mesh {
            node_index: None,
            vertex_buffer: Arc::new(deinterleave(&format, vertex_count, &data).unwrap()),
            index_buffer: Arc::new(IndexBuffer::from_indices(
                indices,
                IndexWidth::U16,
                IndexFormat::TriangleList,
            )),
            segments: Vec::new(),
            bounds: None,
        }
    }

    fn instance(name: &str, node_index: i32) -> GeometryInstance {
        GeometryInstance {
            name: name.to_owned(),
            node_index,
            transform_scale: 2.0,
            transform: Mat4::from_translation(Vec3::X),
        }
    }

    fn section(subsets: &[(u32, u32)]) -> Section {
        Section {
            submeshes: vec![Submesh {
                shader_index: 0,
                ..Submesh::default()
            }],
            subsets: subsets
                .iter()
                .map(|&(index_start, index_length)| Subset {
                    index_start,
                    index_length,
                    ..Subset::default()
                })
                .collect(),
            ..Section::default()
        }
    }

    #[test]
    fn splices_instances_in_place() {
        let mut meshes = vec![
            None,
            Some(source_mesh(8, vec![0, 1, 2, 5, 6, 7])),
            Some(source_mesh(3, vec![0, 1, 2])),
        ];
        let placements = split_instances(
            &mut meshes,
            &[],
            1,
            &section(&[(0, 3), (3, 3)]),
            &[instance("a", 3), instance("b", 255)],
        )
        .unwrap();

        assert_eq!(meshes.len(), 4);
        assert!(meshes[0].is_none());
        assert_eq!(meshes[3].as_ref().unwrap().vertex_count(), 3);

        let b = meshes[2].as_ref().unwrap();
        assert_eq!(b.index_buffer.indices(), &[0, 1, 2]);
        assert_eq!(
            b.vertex_buffer.positions().unwrap(),
            vec![Vec3::new(5.0, 0.0, 0.0), Vec3::new(6.0, 0.0, 0.0), Vec3::new(7.0, 0.0, 0.0)]
        );
        assert_eq!(b.node_index, None);
        assert_eq!(meshes[1].as_ref().unwrap().node_index, Some(3));
        assert_eq!(b.segments[0].index_length, 3);

        assert_eq!(placements[0].mesh_index, 1);
        assert_eq!(placements[1].mesh_index, 2);
        assert_eq!(placements[1].name, "b");
        assert_eq!(placements[1].transform_scale, 2.0);
    }

    #[test]
    fn empty_subset_yields_empty_mesh() {
        let mut meshes = vec![Some(source_mesh(4, vec![0, 1, 2]))];
        split_instances(&mut meshes, &[], 0, &section(&[(0, 0)]), &[instance("a", 0)]).unwrap();
        let mesh = meshes[0].as_ref().unwrap();
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.index_count(), 0);
    }

    #[test]
    fn missing_source_or_subset_is_an_error() {
        let mut meshes = vec![None];
        let err = split_instances(&mut meshes, &[], 0, &section(&[]), &[]).unwrap_err();
        assert!(matches!(err, Error::InstancedSectionMissing(0)));

        let mut meshes = vec![Some(source_mesh(4, vec![0, 1, 2]))];
        let err =
            split_instances(&mut meshes, &[], 0, &section(&[]), &[instance("a", 0)]).unwrap_err();
        assert!(matches!(
            err,
            Error::InstanceSubsetMissing {
                instance: 0,
                subsets: 0
            }
        ));
    }

    proptest! {
        #[test]
        fn rebased_indices_fit_the_slice(indices in prop::collection::vec(0u32..64, 1..48)) {
            let min = *indices.iter().min().unwrap();
            let max = *indices.iter().max().unwrap();
            let len = indices.len() as u32;
            let mut meshes = vec![Some(source_mesh(64, indices))];

            split_instances(&mut meshes, &[], 0, &section(&[(0, len)]), &[instance("a", 0)])
                .unwrap();

            let mesh = meshes[0].as_ref().unwrap();
            prop_assert_eq!(mesh.vertex_count(), (max - min + 1) as usize);
            prop_assert!(mesh.index_buffer.indices().iter().all(|&i| i <= max - min));
        }
    }
}
