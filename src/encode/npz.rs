//! npz encoding: npy v1.0 serialization of the block, zlib-compressed.
//!
//! The payload is exactly what `numpy.save` would write for the subvolume
//! (magic, version, padded header dict, then C-order element bytes), run
//! through a zlib deflate stream. Decompressing and handing the result to
//! `numpy.load` reconstructs the array with its shape and dtype intact.

use std::io::Write;

use bytes::Bytes;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use ndarray::ArrayViewD;

use crate::error::VolumeError;
use crate::types::Element;

/// npy format magic and version (1.0).
const NPY_MAGIC: &[u8] = b"\x93NUMPY\x01\x00";

/// Header sizes are padded to this alignment, per the npy spec.
const NPY_HEADER_ALIGN: usize = 64;

pub(super) fn encode<T: Element>(subvol: ArrayViewD<'_, T>) -> Result<Bytes, VolumeError> {
    let payload = to_npy(subvol);
    compress(&payload)
        .map(Bytes::from)
        .map_err(|e| VolumeError::Encode {
            format: super::DataFormat::Npz,
            reason: e.to_string(),
        })
}

fn compress(payload: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload)?;
    encoder.finish()
}

/// Serialize the block as an npy v1.0 byte stream.
fn to_npy<T: Element>(subvol: ArrayViewD<'_, T>) -> Vec<u8> {
    let shape = subvol
        .shape()
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let mut header = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': ({}), }}",
        T::DATA_TYPE.npy_descr(),
        shape
    );

    // Pad with spaces so magic + length field + header is 64-byte aligned,
    // with a trailing newline closing the header.
    let unpadded = NPY_MAGIC.len() + 2 + header.len() + 1;
    let padding = (NPY_HEADER_ALIGN - unpadded % NPY_HEADER_ALIGN) % NPY_HEADER_ALIGN;
    header.extend(std::iter::repeat(' ').take(padding));
    header.push('\n');

    let elements: Vec<T> = subvol.iter().copied().collect();
    let data = bytemuck::cast_slice::<T, u8>(&elements);

    let mut out = Vec::with_capacity(NPY_MAGIC.len() + 2 + header.len() + data.len());
    out.extend_from_slice(NPY_MAGIC);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(data);
    out
}
