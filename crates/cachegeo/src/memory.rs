//! An in-memory cache image.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::mesh::Texture;
use crate::source::{CacheProfile, CacheSource};
use crate::tags::{PageType, ResourceGestalt, ResourceId, Shader, TagId, TagReference};

/// A [`CacheSource`] backed entirely by memory.
///
/// The address space is a single contiguous image mapped at `base_address`.
/// Resource pages are stored already decoded, so the page selector is
/// ignored.
#[derive(Debug)]
pub struct MemoryCache {
    profile: CacheProfile,
    gestalt: Option<ResourceGestalt>,
    base_address: i64,
    image: Vec<u8>,
    resources: HashMap<ResourceId, Vec<u8>>,
    shaders: HashMap<TagId, Shader>,
    textures: HashMap<TagId, Texture>,
}

impl MemoryCache {
    #[must_use]
    pub fn new(profile: CacheProfile) -> Self {
        Self {
            profile,
            gestalt: None,
            base_address: 0,
            image: Vec::new(),
            resources: HashMap::new(),
            shaders: HashMap::new(),
            textures: HashMap::new(),
        }
    }

    pub fn set_resource_gestalt(&mut self, gestalt: ResourceGestalt) {
        self.gestalt = Some(gestalt);
    }

    /// Map `image` into the address space starting at `base_address`.
    pub fn set_image(&mut self, base_address: i64, image: Vec<u8>) {
        self.base_address = base_address;
        self.image = image;
    }

    pub fn add_resource(&mut self, resource: ResourceId, data: Vec<u8>) {
        self.resources.insert(resource, data);
    }

    pub fn add_shader(&mut self, id: TagId, shader: Shader) {
        self.shaders.insert(id, shader);
    }

    pub fn add_texture(&mut self, texture: Texture) {
        self.textures.insert(texture.id, texture);
    }
}

impl CacheSource for MemoryCache {
    fn profile(&self) -> &CacheProfile {
        &self.profile
    }

    fn resource_gestalt(&self) -> Result<&ResourceGestalt> {
        self.gestalt
            .as_ref()
            .ok_or(Error::MissingTag { class: "zone" })
    }

    fn virtual_data(&self, address: i64) -> Result<&[u8]> {
        address
            .checked_sub(self.base_address)
            .and_then(|offset| usize::try_from(offset).ok())
            .and_then(|offset| self.image.get(offset..))
            .ok_or(Error::AddressOutOfRange { address })
    }

    fn resource_data(&self, resource: ResourceId, _page: PageType) -> Result<Vec<u8>> {
        self.resources
            .get(&resource)
            .cloned()
            .ok_or(Error::MissingResourceData(resource.0))
    }

    fn shader(&self, id: TagId) -> Option<&Shader> {
        self.shaders.get(&id)
    }

    fn texture(&self, bitmap: &TagReference) -> Result<Texture> {
        self.textures
            .get(&bitmap.id)
            .cloned()
            .ok_or(Error::UnresolvedReference {
                class: "bitm",
                id: bitmap.id.0,
            })
    }
}
