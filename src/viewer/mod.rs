//! Viewer state assembly.
//!
//! The consumer side of the volume layer: [`Layer`] binds one volume to
//! display metadata, [`ViewerSession`] collects layers and emits the
//! shareable state document. Sessions publish their volumes through the
//! [`VolumeHost`](crate::volume::VolumeHost) collaborator so that the
//! state's `source` links resolve when clients pull subvolumes later.

mod layer;
mod session;

pub use layer::{Layer, LayerOptions, LayerSpec, SpatialAttributes, SOURCE_SCHEME};
pub use session::{ViewerSession, ViewerState};
