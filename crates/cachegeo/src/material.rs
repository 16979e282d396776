//! Material construction from shader references.

use std::sync::Arc;

use glam::Vec2;

use crate::mesh::{Material, TextureMapping, TextureUsage};
use crate::source::CacheSource;
use crate::tags::{ShaderBlock, ShaderMap, ShaderProperties};

/// Why a shader map produced no texture mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The map's bitmap reference does not resolve.
    UnresolvedBitmap,
    /// The bitmap name matched no usage rule and the shader has several maps.
    UnclassifiedUsage(String),
    /// Resolving the texture failed.
    TextureFailed(String),
}

/// A shader map that was dropped from its material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedMap {
    pub shader_index: usize,
    pub map_index: usize,
    pub reason: SkipReason,
}

/// Outcome of processing one shader map.
#[derive(Debug, Clone, PartialEq)]
pub enum MapOutcome {
    Mapped(TextureMapping),
    Skipped(SkipReason),
}

/// Materials for a shader list, aligned 1:1 with the shader blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedMaterials {
    /// `None` where the shader reference is unresolved.
    pub materials: Vec<Option<Arc<Material>>>,
    pub skipped: Vec<SkippedMap>,
}

/// Build one material per shader block.
///
/// Unresolved shaders leave a `None` in their slot so that submesh shader
/// indices stay valid. Problems with individual maps drop only that map.
pub fn resolve_materials<C: CacheSource + ?Sized>(
    cache: &C,
    shaders: &[ShaderBlock],
) -> ResolvedMaterials {
    let mut resolved = ResolvedMaterials {
        materials: Vec::with_capacity(shaders.len()),
        skipped: Vec::new(),
    };

    for (shader_index, block) in shaders.iter().enumerate() {
        let Some(reference) = &block.shader else {
            tracing::debug!(shader_index, "unresolved shader reference");
            resolved.materials.push(None);
            continue;
        };

        let mut material = Material {
            id: reference.id,
            name: reference.file_name.clone(),
            texture_mappings: Vec::new(),
        };

        let properties = cache
            .shader(reference.id)
            .and_then(|shader| shader.properties.first());
        if let Some(props) = properties {
            for (map_index, map) in props.maps.iter().enumerate() {
                match resolve_map(cache, props, map) {
                    MapOutcome::Mapped(mapping) => material.texture_mappings.push(mapping),
                    MapOutcome::Skipped(reason) => {
                        tracing::debug!(
                            material = %material.name,
                            map_index,
                            ?reason,
                            "dropped shader map"
                        );
                        resolved.skipped.push(SkippedMap {
                            shader_index,
                            map_index,
                            reason,
                        });
                    }
                }
            }
        }

        resolved.materials.push(Some(Arc::new(material)));
    }

    resolved
}

/// Turn one shader map into a texture mapping.
pub fn resolve_map<C: CacheSource + ?Sized>(
    cache: &C,
    props: &ShaderProperties,
    map: &ShaderMap,
) -> MapOutcome {
    let Some(bitmap) = &map.bitmap else {
        return MapOutcome::Skipped(SkipReason::UnresolvedBitmap);
    };

    let usage = match TextureUsage::classify(&bitmap.file_name) {
        Some(usage) => usage,
        None if props.maps.len() == 1 => TextureUsage::Diffuse,
        None => {
            return MapOutcome::Skipped(SkipReason::UnclassifiedUsage(bitmap.file_name.clone()));
        }
    };

    // Tiling indices are sometimes out of range; those maps tile once.
    let tiling = props
        .tiling_data
        .get(usize::from(map.tiling_index))
        .map_or(Vec2::ONE, |tile| tile.truncate().truncate());

    match cache.texture(bitmap) {
        Ok(texture) => MapOutcome::Mapped(TextureMapping {
            usage,
            tiling,
            texture,
        }),
        Err(e) => MapOutcome::Skipped(SkipReason::TextureFailed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCache;
    use crate::mesh::Texture;
    use crate::source::CacheProfile;
    use crate::tags::{Shader, TagId, TagReference};
    use cachegeo_decode::VertexFormatTable;
    use glam::Vec4;

    fn reference(id: i32, name: &str) -> TagReference {
        TagReference {
            id: TagId(id),
            file_name: name.to_string(),
        }
    }

    fn map(id: i32, name: &str, tiling_index: u8) -> ShaderMap {
        ShaderMap {
            bitmap: Some(reference(id, name)),
            tiling_index,
        }
    }

    fn cache() -> MemoryCache {
        let mut cache = MemoryCache::new(CacheProfile::mcc_halo4(VertexFormatTable::new()));
        for (id, name) in [(10, "rock_diff"), (11, "rock_normal"), (12, "rock_spec")] {
            cache.add_texture(Texture {
                id: TagId(id),
                name: name.to_string(),
            });
        }
        cache
    }

    #[test]
    fn unresolved_shaders_keep_their_slot() {
        let cache = cache();
        let shaders = vec![
            ShaderBlock {
                shader: Some(reference(1, "a")),
            },
            ShaderBlock { shader: None },
            ShaderBlock {
                shader: Some(reference(2, "b")),
            },
            ShaderBlock { shader: None },
        ];

        let resolved = resolve_materials(&cache, &shaders);
        assert_eq!(resolved.materials.len(), 4);
        assert_eq!(
            resolved
                .materials
                .iter()
                .map(Option::is_some)
                .collect::<Vec<_>>(),
            [true, false, true, false]
        );
        // Shader metadata is missing, so the materials have no maps.
        assert_eq!(resolved.materials[2].as_ref().unwrap().name, "b");
        assert!(resolved.materials[0].as_ref().unwrap().texture_mappings.is_empty());
    }

    #[test]
    fn maps_are_classified_and_tiled() {
        let mut cache = cache();
        cache.add_shader(
            TagId(1),
            Shader {
                properties: vec![ShaderProperties {
                    maps: vec![
                        map(10, "rock_diff", 0),
                        map(11, "rock_normal", 7),
                        map(12, "rock_spec", 0),
                        ShaderMap {
                            bitmap: None,
                            tiling_index: 0,
                        },
                        map(13, "rock_detail", 0),
                    ],
                    tiling_data: vec![Vec4::new(4.0, 8.0, 0.0, 0.0)],
                }],
            },
        );
        let shaders = vec![ShaderBlock {
            shader: Some(reference(1, "rock")),
        }];

        let resolved = resolve_materials(&cache, &shaders);
        let material = resolved.materials[0].as_ref().unwrap();

        assert_eq!(material.texture_mappings.len(), 2);
        assert_eq!(material.texture_mappings[0].usage, TextureUsage::Diffuse);
        assert_eq!(material.texture_mappings[0].tiling, Vec2::new(4.0, 8.0));
        assert_eq!(material.texture_mappings[1].usage, TextureUsage::Normal);
        assert_eq!(material.texture_mappings[1].tiling, Vec2::ONE);

        let reasons: Vec<_> = resolved.skipped.iter().map(|s| (s.map_index, &s.reason)).collect();
        assert_eq!(reasons.len(), 3);
        assert_eq!(
            reasons[0],
            (2, &SkipReason::UnclassifiedUsage("rock_spec".to_string()))
        );
        assert_eq!(reasons[1], (3, &SkipReason::UnresolvedBitmap));
        assert_eq!(reasons[2].0, 4);
        assert!(matches!(reasons[2].1, SkipReason::TextureFailed(_)));
    }

    #[test]
    fn single_unclassified_map_defaults_to_diffuse() {
        let cache = cache();
        let props = ShaderProperties {
            maps: vec![map(12, "rock_spec", 0)],
            tiling_data: Vec::new(),
        };
        let MapOutcome::Mapped(mapping) = resolve_map(&cache, &props, &props.maps[0]) else {
            panic!("expected a mapping");
        };
        assert_eq!(mapping.usage, TextureUsage::Diffuse);
        assert_eq!(mapping.tiling, Vec2::ONE);
    }
}
