//! Compact pointer expansion.
//!
//! Tag records store 32-bit "compact" pointers. A build-specific codec turns
//! them into absolute addresses within the cache and back again.

/// Conversion between compact in-record pointers and absolute addresses.
///
/// One implementation is selected per loaded cache; callers never branch on
/// the build after that. Neither direction validates the result, so callers
/// must bounds-check an expanded address before reading through it.
pub trait PointerCodec: Send + Sync {
    /// Expand a compact pointer into an absolute address.
    fn expand(&self, pointer: i32) -> i64;

    /// Contract an absolute address back into a compact pointer.
    fn contract(&self, address: i64) -> i32;
}

/// Codec for builds that store pointers as `(address - magic) / 4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledPointerCodec {
    magic: i64,
}

impl ScaledPointerCodec {
    /// The MCC Halo 4 build.
    pub const MCC_HALO4: Self = Self::new(0x4FFF_0000);

    #[must_use]
    pub const fn new(magic: i64) -> Self {
        Self { magic }
    }

    #[must_use]
    pub const fn magic(&self) -> i64 {
        self.magic
    }
}

impl PointerCodec for ScaledPointerCodec {
    fn expand(&self, pointer: i32) -> i64 {
        (i64::from(pointer) << 2) + self.magic
    }

    fn contract(&self, address: i64) -> i32 {
        ((address - self.magic) >> 2) as i32
    }
}
