//! Interfaces to the surrounding cache reader.

use cachegeo_decode::{ByteOrder, PointerCodec, ScaledPointerCodec, VertexFormatTable};

use crate::error::Result;
use crate::mesh::Texture;
use crate::tags::{PageType, ResourceGestalt, ResourceId, Shader, TagId, TagReference};

/// Target architecture a cache was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    #[default]
    X86,
    PowerPc,
}

impl Platform {
    #[must_use]
    pub fn byte_order(self) -> ByteOrder {
        match self {
            Self::X86 => ByteOrder::Little,
            Self::PowerPc => ByteOrder::Big,
        }
    }
}

/// Per-cache configuration, fixed when a cache is loaded.
///
/// The pointer codec is chosen here once; nothing downstream inspects the
/// engine build again.
pub struct CacheProfile {
    codec: Box<dyn PointerCodec>,
    platform: Platform,
    vertex_formats: VertexFormatTable,
}

impl CacheProfile {
    pub fn new(
        codec: impl PointerCodec + 'static,
        platform: Platform,
        vertex_formats: VertexFormatTable,
    ) -> Self {
        Self {
            codec: Box::new(codec),
            platform,
            vertex_formats,
        }
    }

    /// Profile for MCC Halo 4 caches.
    #[must_use]
    pub fn mcc_halo4(vertex_formats: VertexFormatTable) -> Self {
        Self::new(ScaledPointerCodec::MCC_HALO4, Platform::X86, vertex_formats)
    }

    #[must_use]
    pub fn pointer_codec(&self) -> &dyn PointerCodec {
        self.codec.as_ref()
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    #[must_use]
    pub fn byte_order(&self) -> ByteOrder {
        self.platform.byte_order()
    }

    #[must_use]
    pub fn vertex_formats(&self) -> &VertexFormatTable {
        &self.vertex_formats
    }
}

impl std::fmt::Debug for CacheProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheProfile")
            .field("platform", &self.platform)
            .field("vertex_formats", &self.vertex_formats.len())
            .finish_non_exhaustive()
    }
}

/// A loaded cache, as seen by the extraction pipeline.
///
/// Implementations own tag lookup, caching and address translation; this
/// crate only reads through the narrow surface below.
pub trait CacheSource {
    fn profile(&self) -> &CacheProfile;

    /// The global resource gestalt.
    fn resource_gestalt(&self) -> Result<&ResourceGestalt>;

    /// The cache's address space from absolute `address` to its end.
    ///
    /// Must fail with [`crate::Error::AddressOutOfRange`] rather than return an empty
    /// slice for addresses outside the cache.
    fn virtual_data(&self, address: i64) -> Result<&[u8]>;

    /// Decoded bytes of a resource page.
    fn resource_data(&self, resource: ResourceId, page: PageType) -> Result<Vec<u8>>;

    /// Shader metadata for a resolved shader reference, if readable.
    fn shader(&self, id: TagId) -> Option<&Shader>;

    /// Resolve a bitmap reference into a texture handle.
    fn texture(&self, bitmap: &TagReference) -> Result<Texture> {
        Ok(Texture {
            id: bitmap.id,
            name: bitmap.file_name.clone(),
        })
    }

    /// The fixup data address space shared by all gestalt entries.
    fn fixup_data(&self) -> Result<&[u8]> {
        let pointer = self.resource_gestalt()?.fixup_data_pointer;
        let address = self.profile().pointer_codec().expand(pointer);
        self.virtual_data(address)
    }
}

