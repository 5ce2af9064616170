//! # Volstream
//!
//! A subvolume server core for multi-resolution volumetric array data.
//!
//! This library serves bounded, optionally-downsampled boxes ("subvolumes")
//! of large in-memory science arrays to visualization clients, and assembles
//! the shareable state document describing which volumes a viewer session
//! displays.
//!
//! ## Features
//!
//! - **Resolution pyramids**: per-scale geometry derived once from base
//!   shape, offset, and voxel size, with a pinned floor policy for
//!   non-exact divisions
//! - **Bounds-safe extraction**: every request is validated against the
//!   chosen level's geometry before any data is touched
//! - **Wire formats**: raw, npz (zlib-compressed npy), and jpeg encoders
//!   with per-format content types
//! - **Viewer state**: ordered, collision-free layer naming serialized into
//!   a compact, percent-encoded URL fragment
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`volume`] - Pyramid geometry, the volume store, and the registry
//! - [`encode`] - Wire formats and encoders
//! - [`resample`] - Downsampling seam with box-mean and nearest defaults
//! - [`viewer`] - Layers, sessions, and state documents
//! - [`token`] - Token generation seam
//! - [`types`] - Element types and their wire names
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use ndarray::Array3;
//! use volstream::{
//!     DataFormat, LayerOptions, UuidTokenSource, ViewerSession, VolumeOptions,
//!     VolumeRegistry, VolumeStore,
//! };
//!
//! // A labeled 64^3 volume served with the default pyramid
//! let labels = Array3::<u32>::from_elem((64, 64, 64), 0).into_dyn();
//! let store = VolumeStore::new(
//!     Arc::new(labels),
//!     VolumeOptions::default().with_voxel_size([6.0, 6.0, 30.0]),
//!     &UuidTokenSource,
//! )
//! .unwrap();
//!
//! // Clients fetch boxes by scale key
//! let subvolume = store
//!     .subvolume(DataFormat::Raw, [0, 0, 0], [16, 16, 16], Some("2"))
//!     .unwrap();
//! assert_eq!(subvolume.content_type, "application/octet-stream");
//!
//! // Sessions aggregate layers into a shareable state document
//! let registry = VolumeRegistry::new("localhost:8000");
//! let mut session = ViewerSession::new();
//! session
//!     .add(
//!         Arc::new(Array3::<f32>::from_elem((64, 64, 64), 0.0).into_dyn()),
//!         LayerOptions::default().with_name("raw"),
//!     )
//!     .unwrap();
//! let fragment = session.encoded_state(&registry).unwrap();
//! assert!(fragment.contains("layers"));
//! ```

pub mod encode;
pub mod error;
pub mod resample;
pub mod token;
pub mod types;
pub mod viewer;
pub mod volume;

// Re-export commonly used types
pub use encode::{DataFormat, EncodedSubvolume, CONTENT_TYPE_BINARY, CONTENT_TYPE_JPEG};
pub use error::{StateError, VolumeError};
pub use resample::{BoxResampler, NearestResampler, Resample};
pub use token::{Token, TokenSource, UuidTokenSource};
pub use types::{DataType, Element};
pub use viewer::{
    Layer, LayerOptions, LayerSpec, SpatialAttributes, ViewerSession, ViewerState, SOURCE_SCHEME,
};
pub use volume::{
    PyramidGeometry, ScaleGeometry, ScaleInfo, SharedVolume, Volume, VolumeHost, VolumeInfo,
    VolumeKind, VolumeOptions, VolumeRegistry, VolumeStore, DEFAULT_SCALES,
};
