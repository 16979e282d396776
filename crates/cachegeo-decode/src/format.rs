//! Data-driven vertex format templates.
//!
//! Templates come from outside this crate, one table per title variant. They
//! can be built in code or loaded from JSON:
//!
//! ```json
//! [
//!   { "id": 0, "stride": 24, "channels": [
//!       { "usage": "position", "element": "u16nx4", "offset": 0 },
//!       { "usage": "texcoord", "element": "u16nx2", "offset": 8 },
//!       { "usage": "normal", "element": "hend3", "offset": 12 }
//!   ] }
//! ]
//! ```

use std::collections::HashMap;

use serde::Deserialize;

use crate::element::ElementType;
use crate::error::{DecodeError, DecodeResult};

/// What a vertex channel holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelUsage {
    Position,
    Texcoord,
    Normal,
    BlendIndices,
    BlendWeight,
}

/// Placement of one channel within a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ChannelLayout {
    pub usage: ChannelUsage,
    pub element: ElementType,
    pub offset: usize,
}

impl ChannelLayout {
    #[must_use]
    pub fn new(usage: ChannelUsage, element: ElementType, offset: usize) -> Self {
        Self {
            usage,
            element,
            offset,
        }
    }
}

/// One vertex format: a stride and an ordered channel list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawVertexFormat")]
pub struct VertexFormat {
    id: u16,
    stride: usize,
    channels: Vec<ChannelLayout>,
}

#[derive(Deserialize)]
struct RawVertexFormat {
    id: u16,
    stride: usize,
    channels: Vec<ChannelLayout>,
}

impl TryFrom<RawVertexFormat> for VertexFormat {
    type Error = DecodeError;

    fn try_from(raw: RawVertexFormat) -> DecodeResult<Self> {
        Self::new(raw.id, raw.stride, raw.channels)
    }
}

impl VertexFormat {
    /// Create a format, checking that every channel fits within the stride.
    pub fn new(id: u16, stride: usize, channels: Vec<ChannelLayout>) -> DecodeResult<Self> {
        if stride == 0 {
            return Err(DecodeError::InvalidTemplate {
                format: id,
                reason: "zero stride".to_string(),
            });
        }
        for channel in &channels {
            if channel.offset + channel.element.size() > stride {
                return Err(DecodeError::InvalidTemplate {
                    format: id,
                    reason: format!(
                        "{:?} channel at offset {} overruns stride {stride}",
                        channel.usage, channel.offset
                    ),
                });
            }
        }
        Ok(Self {
            id,
            stride,
            channels,
        })
    }

    #[must_use]
    pub fn id(&self) -> u16 {
        self.id
    }

    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[must_use]
    pub fn channels(&self) -> &[ChannelLayout] {
        &self.channels
    }
}

/// Vertex formats for one title variant, keyed by format id.
#[derive(Debug, Clone, Default)]
pub struct VertexFormatTable {
    formats: HashMap<u16, VertexFormat>,
}

impl VertexFormatTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of formats.
    pub fn from_json(json: &str) -> DecodeResult<Self> {
        let formats: Vec<VertexFormat> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for format in formats {
            table.insert(format)?;
        }
        Ok(table)
    }

    /// Add a format. Ids must be unique within a table.
    pub fn insert(&mut self, format: VertexFormat) -> DecodeResult<()> {
        let id = format.id;
        if self.formats.insert(id, format).is_some() {
            return Err(DecodeError::InvalidTemplate {
                format: id,
                reason: "duplicate format id".to_string(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: u16) -> Option<&VertexFormat> {
        self.formats.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
