//! Layers: named, styled references to volumes within a session.

use std::sync::Arc;

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use crate::encode::DataFormat;
use crate::error::VolumeError;
use crate::token::TokenSource;
use crate::types::Element;
use crate::volume::{SharedVolume, Volume, VolumeKind, VolumeOptions, VolumeStore, DEFAULT_SCALES};

/// URL scheme of layer `source` fields; a client-side convention.
pub const SOURCE_SCHEME: &str = "python";

// =============================================================================
// SpatialAttributes
// =============================================================================

/// Capability of a raw data source that carries its own placement metadata.
///
/// Both triples are reported in stored `(z, y, x)` axis order, the
/// convention of array containers that embed them; layer construction
/// reverses them into the external `(x, y, z)` order.
pub trait SpatialAttributes {
    /// Physical voxel size, if recorded on the source.
    fn resolution(&self) -> Option<[f64; 3]>;

    /// Lower voxel bound, if recorded on the source.
    fn offset(&self) -> Option<[i64; 3]>;
}

// =============================================================================
// LayerOptions
// =============================================================================

/// Construction options for a [`Layer`] built from raw data.
///
/// Unset fields fall back to attribute metadata, session defaults, or the
/// volume defaults, in that order.
#[derive(Debug, Clone, Default)]
pub struct LayerOptions {
    /// Explicit display name; session assigns one when unset
    pub name: Option<String>,

    /// Base voxel size; overrides attributes and the session default
    pub voxel_size: Option<[f64; 3]>,

    /// Base lower voxel bound; unset means zero or attribute-supplied
    pub offset: Option<[i64; 3]>,

    /// Shader source handed to the client verbatim
    pub shader: Option<String>,

    /// Initial visibility; unset leaves the client default in place
    pub visible: Option<bool>,

    /// Default wire format of the underlying store
    pub encoding: Option<DataFormat>,

    /// Preferred chunk shapes of the underlying store
    pub chunk_data_sizes: Option<Vec<[u32; 3]>>,

    /// Forced display kind of the underlying store
    pub volume_kind: Option<VolumeKind>,

    /// Scale list of the underlying store
    pub scales: Option<Vec<u32>>,
}

impl LayerOptions {
    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the base voxel size.
    pub fn with_voxel_size(mut self, voxel_size: [f64; 3]) -> Self {
        self.voxel_size = Some(voxel_size);
        self
    }

    /// Set the base lower voxel bound.
    pub fn with_offset(mut self, offset: [i64; 3]) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set the shader source.
    pub fn with_shader(mut self, shader: impl Into<String>) -> Self {
        self.shader = Some(shader.into());
        self
    }

    /// Set the initial visibility.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    /// Set the store's default wire format.
    pub fn with_encoding(mut self, encoding: DataFormat) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Advertise preferred chunk shapes on the store.
    pub fn with_chunk_data_sizes(mut self, sizes: Vec<[u32; 3]>) -> Self {
        self.chunk_data_sizes = Some(sizes);
        self
    }

    /// Force the store's display kind.
    pub fn with_volume_kind(mut self, kind: VolumeKind) -> Self {
        self.volume_kind = Some(kind);
        self
    }

    /// Replace the store's default scale list.
    pub fn with_scales(mut self, scales: Vec<u32>) -> Self {
        self.scales = Some(scales);
        self
    }
}

// =============================================================================
// LayerSpec
// =============================================================================

/// The serialized link descriptor of one layer.
///
/// Only explicitly-supplied display options appear; an absent key means the
/// client default applies, which is not the same as `false` or empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Display kind of the referenced volume
    #[serde(rename = "type")]
    pub kind: VolumeKind,

    /// Volume address: `<scheme>://<server_url>/<token>`
    pub source: String,

    /// Shader source, when supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shader: Option<String>,

    /// Visibility flag, when supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

// =============================================================================
// Layer
// =============================================================================

/// A named, styled reference to one volume.
///
/// The layer shares the volume (and through it the raw array); it owns
/// neither.
pub struct Layer {
    volume: SharedVolume,
    name: Option<String>,
    shader: Option<String>,
    visible: Option<bool>,
}

impl Layer {
    /// Build a layer and its backing store from raw data.
    ///
    /// Placement resolution: an explicit `offset` wins; otherwise the
    /// offset defaults to zero and, when `attrs` is present, attribute
    /// offset and resolution are adopted (reversed from stored z,y,x into
    /// x,y,z). Voxel size precedence: explicit option, then attribute
    /// resolution, then `default_voxel_size`.
    pub fn new<T: Element>(
        data: Arc<ArrayD<T>>,
        attrs: Option<&dyn SpatialAttributes>,
        options: LayerOptions,
        default_voxel_size: [f64; 3],
        tokens: &dyn TokenSource,
    ) -> Result<Self, VolumeError> {
        let mut offset = options.offset;
        let mut attr_resolution = None;
        if offset.is_none() {
            if let Some(attrs) = attrs {
                attr_resolution = attrs.resolution().map(reverse_f64);
                if let Some(attr_offset) = attrs.offset() {
                    offset = Some(reverse_i64(attr_offset));
                }
            }
        }

        let volume_options = VolumeOptions {
            offset: offset.unwrap_or([0; 3]),
            voxel_size: options
                .voxel_size
                .or(attr_resolution)
                .unwrap_or(default_voxel_size),
            encoding: options.encoding.unwrap_or(DataFormat::Npz),
            chunk_data_sizes: options.chunk_data_sizes,
            volume_kind: options.volume_kind,
            scales: options.scales.unwrap_or_else(|| DEFAULT_SCALES.to_vec()),
        };
        let store = VolumeStore::new(data, volume_options, tokens)?;

        Ok(Self {
            volume: Arc::new(store),
            name: options.name,
            shader: options.shader,
            visible: options.visible,
        })
    }

    /// Wrap an existing volume.
    pub fn from_volume(volume: SharedVolume) -> Self {
        Self {
            volume,
            name: None,
            shader: None,
            visible: None,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the shader source.
    pub fn with_shader(mut self, shader: impl Into<String>) -> Self {
        self.shader = Some(shader.into());
        self
    }

    /// Set the initial visibility.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    /// The referenced volume.
    pub fn volume(&self) -> &SharedVolume {
        &self.volume
    }

    /// The explicit display name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Build the link descriptor pointing clients at the volume.
    ///
    /// Pure function of current state.
    pub fn layer_spec(&self, server_url: &str) -> LayerSpec {
        LayerSpec {
            kind: self.volume.volume_kind(),
            source: format!("{SOURCE_SCHEME}://{server_url}/{}", self.volume.token()),
            shader: self.shader.clone(),
            visible: self.visible,
        }
    }
}

fn reverse_i64(triple: [i64; 3]) -> [i64; 3] {
    [triple[2], triple[1], triple[0]]
}

fn reverse_f64(triple: [f64; 3]) -> [f64; 3] {
    [triple[2], triple[1], triple[0]]
}

// =============================================================================
// Tests
// =============================================================================
