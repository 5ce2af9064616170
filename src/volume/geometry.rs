//! Pyramid geometry derivation.
//!
//! A volume's resolution pyramid is fully described by its base attributes
//! (shape, offset, voxel size, all in externally-facing x,y,z order) and a
//! list of integer downsample factors. [`PyramidGeometry::derive`] computes
//! the per-scale records once, at construction; everything after that is
//! lookup.
//!
//! Per-axis rules, for a factor `s`:
//!
//! - `shape = base_shape / s` (integer floor division)
//! - `offset = base_offset * s`
//! - `voxel_size = base_voxel_size * s`
//!
//! Floor division is the pinned rounding policy for shapes that do not
//! divide exactly; it guarantees that a full-extent box at any scale maps
//! back inside the base array.

use crate::error::VolumeError;

// =============================================================================
// ScaleGeometry
// =============================================================================

/// Derived geometry of one pyramid level, in x,y,z axis order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleGeometry {
    /// Per-axis voxel extents at this scale
    pub shape: [u64; 3],

    /// Per-axis lower voxel bound at this scale
    pub offset: [i64; 3],

    /// Physical size of one voxel at this scale
    pub voxel_size: [f64; 3],
}

impl ScaleGeometry {
    /// Upper voxel bound: `offset + shape` per axis.
    pub fn upper_bound(&self) -> [i64; 3] {
        [
            self.offset[0] + self.shape[0] as i64,
            self.offset[1] + self.shape[1] as i64,
            self.offset[2] + self.shape[2] as i64,
        ]
    }
}

// =============================================================================
// PyramidGeometry
// =============================================================================

/// The complete resolution pyramid of one volume.
///
/// Immutable once derived. Scale order is the configuration order and is
/// preserved through [`scales`](Self::scales) and the info document.
#[derive(Debug, Clone)]
pub struct PyramidGeometry {
    levels: Vec<(u32, ScaleGeometry)>,
}

impl PyramidGeometry {
    /// Derive per-scale geometry from base attributes.
    ///
    /// All scales resolve or the call fails; there are no partial results.
    ///
    /// # Errors
    ///
    /// `InvalidScaleList` if `scales` is empty, contains a zero factor, or
    /// contains a duplicate factor. Duplicates are rejected because scale
    /// keys are derived from the factor value and duplicate keys would make
    /// addressing ambiguous.
    pub fn derive(
        base_shape: [u64; 3],
        base_offset: [i64; 3],
        base_voxel_size: [f64; 3],
        scales: &[u32],
    ) -> Result<Self, VolumeError> {
        if scales.is_empty() {
            return Err(VolumeError::InvalidScaleList {
                reason: "scale list is empty".to_string(),
            });
        }

        let mut levels = Vec::with_capacity(scales.len());
        for &scale in scales {
            if scale == 0 {
                return Err(VolumeError::InvalidScaleList {
                    reason: "scale factors must be positive".to_string(),
                });
            }
            if levels.iter().any(|&(s, _)| s == scale) {
                return Err(VolumeError::InvalidScaleList {
                    reason: format!("duplicate scale factor {scale}"),
                });
            }

            let s = u64::from(scale);
            let geometry = ScaleGeometry {
                shape: [
                    base_shape[0] / s,
                    base_shape[1] / s,
                    base_shape[2] / s,
                ],
                offset: [
                    base_offset[0] * s as i64,
                    base_offset[1] * s as i64,
                    base_offset[2] * s as i64,
                ],
                voxel_size: [
                    base_voxel_size[0] * s as f64,
                    base_voxel_size[1] * s as f64,
                    base_voxel_size[2] * s as f64,
                ],
            };
            levels.push((scale, geometry));
        }

        Ok(Self { levels })
    }

    /// Configured scale factors, in configuration order.
    pub fn scales(&self) -> impl Iterator<Item = u32> + '_ {
        self.levels.iter().map(|&(s, _)| s)
    }

    /// Scale factors with their geometry, in configuration order.
    pub fn levels(&self) -> impl Iterator<Item = (u32, &ScaleGeometry)> {
        self.levels.iter().map(|(s, g)| (*s, g))
    }

    /// Number of pyramid levels.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Geometry of the given scale, if configured.
    pub fn get(&self, scale: u32) -> Option<&ScaleGeometry> {
        self.levels
            .iter()
            .find(|&&(s, _)| s == scale)
            .map(|(_, g)| g)
    }

    /// External addressing key of a scale: the decimal factor string.
    pub fn scale_key(scale: u32) -> String {
        scale.to_string()
    }

    /// Resolve an external scale key back to its factor.
    ///
    /// Only the canonical key of a configured scale resolves; lenient
    /// spellings that merely parse to the same factor (`"01"`, `"+1"`) do
    /// not, and there is no fallback.
    pub fn resolve_key(&self, key: &str) -> Option<u32> {
        self.levels
            .iter()
            .map(|&(s, _)| s)
            .find(|&s| Self::scale_key(s) == key)
    }
}

// =============================================================================
// Tests
// =============================================================================
