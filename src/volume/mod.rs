//! Volume abstraction layer.
//!
//! This module owns the core of the server: per-scale geometry, the volume
//! store, and the registry volumes are published through.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            ViewerSession                │
//! │   (layers, naming, state document)      │
//! └────────────────────┬────────────────────┘
//!                      │ register / lookup by token
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            VolumeRegistry               │
//! │     (idempotent token-keyed upsert)     │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            Volume trait                 │
//! │   (element-type-erased store handle)    │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           VolumeStore<T>                │
//! │  geometry · bounds checks · extraction  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! A [`VolumeStore`] is generic over its element type; the [`Volume`] trait
//! erases that parameter so registries and sessions can hold mixed volumes.

mod geometry;
mod registry;
mod store;

pub use geometry::{PyramidGeometry, ScaleGeometry};
pub use registry::{VolumeHost, VolumeRegistry};
pub use store::{ScaleInfo, VolumeInfo, VolumeOptions, VolumeStore, DEFAULT_SCALES};

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::encode::{DataFormat, EncodedSubvolume};
use crate::error::VolumeError;
use crate::token::Token;
use crate::types::DataType;

// =============================================================================
// VolumeKind
// =============================================================================

/// What a volume's voxels mean to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeKind {
    /// Continuous intensity data
    Image,
    /// Discrete object labels
    Segmentation,
    /// Application-defined rendering
    Custom,
}

impl VolumeKind {
    /// Wire name of this kind, matching the serialized form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            VolumeKind::Image => "image",
            VolumeKind::Segmentation => "segmentation",
            VolumeKind::Custom => "custom",
        }
    }

    /// Infer a kind from channel count and element type.
    ///
    /// Single-channel volumes of a wide unsigned integer type (uint16 and
    /// up) read as label maps; everything else reads as intensity data.
    pub fn infer(num_channels: usize, data_type: DataType) -> Self {
        if num_channels == 1 && data_type.is_unsigned() && data_type.size_in_bytes() >= 2 {
            VolumeKind::Segmentation
        } else {
            VolumeKind::Image
        }
    }
}

impl fmt::Display for VolumeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Volume trait
// =============================================================================

/// Element-type-erased handle to a volume store.
///
/// Everything a registry, layer, or transport needs from a store without
/// knowing its element type. All methods take `&self` and mutate nothing:
/// a volume may serve any number of concurrent extractions.
pub trait Volume: Send + Sync {
    /// The store's external addressing token.
    fn token(&self) -> &Token;

    /// The store's display kind.
    fn volume_kind(&self) -> VolumeKind;

    /// Per-scale metadata document. Pure: identical results across calls.
    fn info(&self) -> VolumeInfo;

    /// Extract and encode an axis-aligned box from one pyramid level.
    ///
    /// `start` and `end` are x,y,z voxel coordinates at the chosen scale;
    /// `scale_key` defaults to full resolution when omitted.
    fn subvolume(
        &self,
        format: DataFormat,
        start: [i64; 3],
        end: [i64; 3],
        scale_key: Option<&str>,
    ) -> Result<EncodedSubvolume, VolumeError>;

    /// Fetch a mesh for one labeled object.
    ///
    /// No shipped store implements meshes; the method exists so the
    /// capability set is explicit and callers fail with `NotSupported`
    /// rather than a missing route.
    fn object_mesh(&self, object_id: u64) -> Result<Bytes, VolumeError>;
}

/// Shared, erased volume handle.
pub type SharedVolume = Arc<dyn Volume>;

// =============================================================================
// Tests
// =============================================================================
