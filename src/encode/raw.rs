//! Raw encoding: C-order element bytes with no framing.

use bytes::Bytes;
use ndarray::ArrayViewD;

use crate::types::Element;

/// Serialize the block's elements in logical (row-major) order.
///
/// The iteration order matches C order regardless of the view's memory
/// layout, so sliced views encode correctly without an intermediate copy to
/// standard layout.
pub(super) fn encode<T: Element>(subvol: ArrayViewD<'_, T>) -> Bytes {
    let elements: Vec<T> = subvol.iter().copied().collect();
    Bytes::from(bytemuck::cast_slice::<T, u8>(&elements).to_vec())
}
