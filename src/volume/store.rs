//! The volume store: one served volume and its extraction pipeline.
//!
//! A [`VolumeStore`] wraps an in-memory array snapshot together with the
//! derived pyramid geometry and the metadata a viewer needs. Extraction
//! walks the pipeline:
//!
//! ```text
//! resolve scale key → bounds check → slice base array →
//!     resample (scale > 1) → encode → (bytes, content type)
//! ```
//!
//! The raw array arrives as `Arc<ArrayD<T>>` and is never copied or
//! mutated; owners that need to change voxel data publish a fresh array and
//! build a new store, so concurrent extractions always observe one
//! consistent snapshot.
//!
//! Axis conventions: the raw array is stored slowest-to-fastest as
//! `[z, y, x]` (rank 3) or `[channel, z, y, x]` (rank 4), while every
//! externally-facing triple (box coordinates, offsets, voxel sizes) is
//! `(x, y, z)`. The store reverses between the two at the slicing boundary.

use std::sync::Arc;

use bytemuck::Zeroable;
use bytes::Bytes;
use ndarray::{ArrayD, ArrayView3, ArrayViewD, Axis, Ix3, IxDyn, SliceInfoElem};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::encode::{self, DataFormat, EncodedSubvolume};
use crate::error::VolumeError;
use crate::resample::{BoxResampler, NearestResampler, Resample};
use crate::token::{Token, TokenSource};
use crate::types::{DataType, Element};

use super::geometry::PyramidGeometry;
use super::{Volume, VolumeKind};

/// Default resolution pyramid: full resolution plus three power-of-two levels.
pub const DEFAULT_SCALES: [u32; 4] = [1, 2, 4, 8];

// =============================================================================
// VolumeOptions
// =============================================================================

/// Construction options for a [`VolumeStore`].
///
/// Everything has a usable default; override with the `with_*` builders.
#[derive(Debug, Clone)]
pub struct VolumeOptions {
    /// Base lower voxel bound, x,y,z (default all-zero)
    pub offset: [i64; 3],

    /// Base physical voxel size, x,y,z (default all-one)
    pub voxel_size: [f64; 3],

    /// Default wire format advertised in the info document
    pub encoding: DataFormat,

    /// Preferred chunk shapes advertised to clients, if any
    pub chunk_data_sizes: Option<Vec<[u32; 3]>>,

    /// Display kind; inferred from the data when unset
    pub volume_kind: Option<VolumeKind>,

    /// Downsample factors of the resolution pyramid
    pub scales: Vec<u32>,
}

impl Default for VolumeOptions {
    fn default() -> Self {
        Self {
            offset: [0; 3],
            voxel_size: [1.0; 3],
            encoding: DataFormat::Npz,
            chunk_data_sizes: None,
            volume_kind: None,
            scales: DEFAULT_SCALES.to_vec(),
        }
    }
}

impl VolumeOptions {
    /// Set the base lower voxel bound.
    pub fn with_offset(mut self, offset: [i64; 3]) -> Self {
        self.offset = offset;
        self
    }

    /// Set the base voxel size.
    pub fn with_voxel_size(mut self, voxel_size: [f64; 3]) -> Self {
        self.voxel_size = voxel_size;
        self
    }

    /// Set the advertised default wire format.
    pub fn with_encoding(mut self, encoding: DataFormat) -> Self {
        self.encoding = encoding;
        self
    }

    /// Advertise preferred chunk shapes.
    pub fn with_chunk_data_sizes(mut self, sizes: Vec<[u32; 3]>) -> Self {
        self.chunk_data_sizes = Some(sizes);
        self
    }

    /// Force the display kind instead of inferring it.
    pub fn with_volume_kind(mut self, kind: VolumeKind) -> Self {
        self.volume_kind = Some(kind);
        self
    }

    /// Replace the default scale list.
    pub fn with_scales(mut self, scales: Vec<u32>) -> Self {
        self.scales = scales;
        self
    }
}

// =============================================================================
// Info document
// =============================================================================

/// Per-scale entry of the info document.
///
/// Field spelling follows the wire protocol exactly (mixed snake and camel
/// case).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleInfo {
    /// Token of the owning volume
    pub volume_key: Token,

    /// External addressing key of this scale
    pub scale_key: String,

    /// Lower voxel bound at this scale, x,y,z
    #[serde(rename = "lowerVoxelBound")]
    pub lower_voxel_bound: [i64; 3],

    /// Upper voxel bound at this scale, x,y,z
    #[serde(rename = "upperVoxelBound")]
    pub upper_voxel_bound: [i64; 3],

    /// Physical voxel size at this scale, x,y,z
    #[serde(rename = "voxelSize")]
    pub voxel_size: [f64; 3],
}

/// The metadata document a store serves to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    /// Display kind
    pub volume_type: VolumeKind,

    /// Element type, numpy-style name
    pub data_type: DataType,

    /// Default wire format
    pub encoding: DataFormat,

    /// Channel count
    pub num_channels: usize,

    /// One entry per configured scale, in configuration order
    pub scales: Vec<ScaleInfo>,

    /// Preferred chunk shapes, only present when advertised
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_data_sizes: Option<Vec<[u32; 3]>>,
}

// =============================================================================
// VolumeStore
// =============================================================================

/// One served volume: array snapshot, pyramid geometry, metadata, token.
///
/// Immutable after construction. Extraction takes `&self` and shares the
/// snapshot, so a store behind an `Arc` serves concurrent requests without
/// locking.
pub struct VolumeStore<T: Element> {
    token: Token,
    data: Arc<ArrayD<T>>,
    geometry: PyramidGeometry,
    num_channels: usize,
    encoding: DataFormat,
    chunk_data_sizes: Option<Vec<[u32; 3]>>,
    volume_kind: VolumeKind,
    resampler: Arc<dyn Resample<T>>,
}

impl<T: Element> VolumeStore<T> {
    /// Build a store around an array snapshot.
    ///
    /// The array must be rank 3 `[z, y, x]` or rank 4 `[channel, z, y, x]`.
    /// A fresh token is drawn from `tokens`; the display kind, when not
    /// forced in `options`, is inferred per [`VolumeKind::infer`], and the
    /// kind picks the default resampler: block mean for images, nearest for
    /// segmentations (averaging label IDs would fabricate labels).
    ///
    /// # Errors
    ///
    /// `InvalidRank` for any other rank, `InvalidScaleList` and
    /// `InvalidChunkSizes` per the respective validations.
    pub fn new(
        data: Arc<ArrayD<T>>,
        options: VolumeOptions,
        tokens: &dyn TokenSource,
    ) -> Result<Self, VolumeError> {
        let shape = data.shape();
        let (num_channels, spatial) = match shape {
            [z, y, x] => (1, [*z, *y, *x]),
            [c, z, y, x] => (*c, [*z, *y, *x]),
            _ => return Err(VolumeError::InvalidRank { rank: data.ndim() }),
        };

        if let Some(chunks) = &options.chunk_data_sizes {
            validate_chunk_sizes(chunks)?;
        }

        // Spatial dims reverse into the externally-facing x,y,z order.
        let base_shape = [spatial[2] as u64, spatial[1] as u64, spatial[0] as u64];
        let geometry =
            PyramidGeometry::derive(base_shape, options.offset, options.voxel_size, &options.scales)?;

        let volume_kind = options
            .volume_kind
            .unwrap_or_else(|| VolumeKind::infer(num_channels, T::DATA_TYPE));
        let resampler: Arc<dyn Resample<T>> = match volume_kind {
            VolumeKind::Segmentation => Arc::new(NearestResampler),
            _ => Arc::new(BoxResampler),
        };

        Ok(Self {
            token: tokens.next_token(),
            data,
            geometry,
            num_channels,
            encoding: options.encoding,
            chunk_data_sizes: options.chunk_data_sizes,
            volume_kind,
            resampler,
        })
    }

    /// Replace the resampler chosen at construction.
    pub fn with_resampler(mut self, resampler: Arc<dyn Resample<T>>) -> Self {
        self.resampler = resampler;
        self
    }

    /// The store's external addressing token.
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// The store's display kind.
    pub fn volume_kind(&self) -> VolumeKind {
        self.volume_kind
    }

    /// Element type of the stored array.
    pub fn data_type(&self) -> DataType {
        T::DATA_TYPE
    }

    /// Channel count (1 for rank-3 arrays).
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// The derived resolution pyramid.
    pub fn geometry(&self) -> &PyramidGeometry {
        &self.geometry
    }

    /// Build the metadata document for this store.
    pub fn info(&self) -> VolumeInfo {
        let scales = self
            .geometry
            .levels()
            .map(|(scale, level)| ScaleInfo {
                volume_key: self.token.clone(),
                scale_key: PyramidGeometry::scale_key(scale),
                lower_voxel_bound: level.offset,
                upper_voxel_bound: level.upper_bound(),
                voxel_size: level.voxel_size,
            })
            .collect();

        VolumeInfo {
            volume_type: self.volume_kind,
            data_type: T::DATA_TYPE,
            encoding: self.encoding,
            num_channels: self.num_channels,
            scales,
            chunk_data_sizes: self.chunk_data_sizes.clone(),
        }
    }

    /// Extract and encode an axis-aligned box from one pyramid level.
    ///
    /// `start`/`end` are x,y,z voxel coordinates in the chosen scale's
    /// coordinate system; `end` is exclusive. With `scale_key` omitted the
    /// request addresses full resolution.
    ///
    /// # Errors
    ///
    /// `UnknownScaleKey` when the key does not resolve (there is no
    /// fallback to full resolution), `OutOfBounds` naming the first axis
    /// whose interval violates the level geometry, `UnsupportedFormat` /
    /// `Encode` from the encoding stage.
    pub fn subvolume(
        &self,
        format: DataFormat,
        start: [i64; 3],
        end: [i64; 3],
        scale_key: Option<&str>,
    ) -> Result<EncodedSubvolume, VolumeError> {
        let scale = match scale_key {
            Some(key) => {
                self.geometry
                    .resolve_key(key)
                    .ok_or_else(|| VolumeError::UnknownScaleKey {
                        key: key.to_string(),
                    })?
            }
            None => 1,
        };
        let level = self
            .geometry
            .get(scale)
            .ok_or_else(|| VolumeError::UnknownScaleKey {
                key: PyramidGeometry::scale_key(scale),
            })?;

        debug!(
            token = %self.token,
            scale,
            ?start,
            ?end,
            offset = ?level.offset,
            shape = ?level.shape,
            "extracting subvolume"
        );

        let upper = level.upper_bound();
        for axis in 0..3 {
            if end[axis] < start[axis]
                || start[axis] < level.offset[axis]
                || end[axis] - level.offset[axis] > level.shape[axis] as i64
            {
                return Err(VolumeError::OutOfBounds {
                    axis,
                    start: start[axis],
                    end: end[axis],
                    lower: level.offset[axis],
                    upper: upper[axis],
                });
            }
        }

        // Box coordinates address the raw array in reversed axis order,
        // scaled back to base resolution; rank 4 keeps the full channel
        // extent.
        let rank = self.data.ndim();
        let mut slices: Vec<SliceInfoElem> = Vec::with_capacity(rank);
        if rank == 4 {
            slices.push(SliceInfoElem::Slice {
                start: 0,
                end: None,
                step: 1,
            });
        }
        for &axis in &[2usize, 1, 0] {
            let lo = (start[axis] - level.offset[axis]) * i64::from(scale);
            let hi = (end[axis] - level.offset[axis]) * i64::from(scale);
            slices.push(SliceInfoElem::Slice {
                start: lo as isize,
                end: Some(hi as isize),
                step: 1,
            });
        }
        let view = self.data.slice(slices.as_slice());

        if scale == 1 {
            return encode::encode_subvolume(view, format);
        }

        let reduced = if rank == 3 {
            self.resampler.resample(spatial_view(view), scale).into_dyn()
        } else {
            let extents = [
                self.num_channels,
                (end[2] - start[2]) as usize,
                (end[1] - start[1]) as usize,
                (end[0] - start[0]) as usize,
            ];
            let mut out = ArrayD::from_elem(IxDyn(&extents), T::zeroed());
            for channel in 0..self.num_channels {
                let block = spatial_view(view.index_axis(Axis(0), channel));
                let channel_reduced = self.resampler.resample(block, scale);
                out.index_axis_mut(Axis(0), channel)
                    .assign(&channel_reduced);
            }
            out
        };
        encode::encode_subvolume(reduced.view(), format)
    }

    /// Fetch a mesh for one labeled object. Not implemented by this store.
    pub fn object_mesh(&self, _object_id: u64) -> Result<Bytes, VolumeError> {
        Err(VolumeError::NotSupported {
            operation: "object mesh retrieval",
        })
    }
}

impl<T: Element> Volume for VolumeStore<T> {
    fn token(&self) -> &Token {
        self.token()
    }

    fn volume_kind(&self) -> VolumeKind {
        self.volume_kind()
    }

    fn info(&self) -> VolumeInfo {
        self.info()
    }

    fn subvolume(
        &self,
        format: DataFormat,
        start: [i64; 3],
        end: [i64; 3],
        scale_key: Option<&str>,
    ) -> Result<EncodedSubvolume, VolumeError> {
        self.subvolume(format, start, end, scale_key)
    }

    fn object_mesh(&self, object_id: u64) -> Result<Bytes, VolumeError> {
        self.object_mesh(object_id)
    }
}

/// View a spatial block as exactly 3-dimensional.
///
/// Callers only hand in views sliced down to the three spatial axes.
fn spatial_view<T: Element>(view: ArrayViewD<'_, T>) -> ArrayView3<'_, T> {
    view.into_dimensionality::<Ix3>()
        .expect("spatial block views are 3-dimensional")
}

fn validate_chunk_sizes(chunks: &[[u32; 3]]) -> Result<(), VolumeError> {
    if chunks.is_empty() {
        return Err(VolumeError::InvalidChunkSizes {
            reason: "chunk size list is empty".to_string(),
        });
    }
    for (index, chunk) in chunks.iter().enumerate() {
        if chunk.iter().any(|&c| c == 0) {
            return Err(VolumeError::InvalidChunkSizes {
                reason: format!("entry {index} has a non-positive component: {chunk:?}"),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
