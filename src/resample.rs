//! Downsampling of extracted blocks.
//!
//! Extraction at a scale factor `s` slices the base-resolution array over an
//! `s`-times-larger box and hands each channel's 3-d block to a [`Resample`]
//! implementation to reduce it back to the requested extent. The trait is the
//! seam: the exact reduction kernel is a policy choice, not a property of the
//! store.
//!
//! Two implementations ship:
//!
//! - [`BoxResampler`]: mean over each `s`-cube; the default for image
//!   volumes.
//! - [`NearestResampler`]: stride sampling; the default for segmentation
//!   volumes, where averaging label IDs would fabricate labels.

use ndarray::{s, Array3, ArrayView3};

use crate::types::Element;

/// Reduces a 3-d block by an integer factor.
///
/// Input axes are `(z, y, x)` in raw-array order. Implementations must
/// return an array whose extent on every axis is the floor of the input
/// extent divided by `factor`, and must be pure: no state, same output for
/// the same input.
pub trait Resample<T: Element>: Send + Sync {
    /// Reduce `source` by `factor` along every axis. `factor` is >= 2.
    fn resample(&self, source: ArrayView3<'_, T>, factor: u32) -> Array3<T>;
}

// =============================================================================
// BoxResampler
// =============================================================================

/// Mean-of-block reduction.
///
/// Each output voxel is the arithmetic mean of the corresponding
/// `factor`-cube, accumulated in f64 and narrowed back to the element type.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxResampler;

impl<T: Element> Resample<T> for BoxResampler {
    fn resample(&self, source: ArrayView3<'_, T>, factor: u32) -> Array3<T> {
        let f = factor as usize;
        let (d, h, w) = source.dim();
        let block_len = (f * f * f) as f64;
        Array3::from_shape_fn((d / f, h / f, w / f), |(z, y, x)| {
            let block = source.slice(s![
                z * f..(z + 1) * f,
                y * f..(y + 1) * f,
                x * f..(x + 1) * f
            ]);
            let sum: f64 = block.iter().map(|v| v.to_f64()).sum();
            T::from_f64(sum / block_len)
        })
    }
}

// =============================================================================
// NearestResampler
// =============================================================================

/// Stride-sampling reduction: keeps the first voxel of each block.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestResampler;

impl<T: Element> Resample<T> for NearestResampler {
    fn resample(&self, source: ArrayView3<'_, T>, factor: u32) -> Array3<T> {
        let f = factor as usize;
        let (d, h, w) = source.dim();
        Array3::from_shape_fn((d / f, h / f, w / f), |(z, y, x)| {
            source[(z * f, y * f, x * f)]
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
