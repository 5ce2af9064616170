//! Wire encodings for extracted subvolumes.
//!
//! A subvolume fetch names a [`DataFormat`]; the matching encoder turns the
//! extracted block into bytes plus a content type:
//!
//! - **raw**: C-order element bytes, nothing else. Exact round trip.
//! - **npz**: npy v1.0 serialization of the block, zlib-compressed.
//! - **jpeg**: lossy preview encoding for uint8 volumes; the (z, y, x)
//!   block renders as an x-wide, z·y-tall image.
//!
//! Unknown format names fail with
//! [`UnsupportedFormat`](crate::error::VolumeError::UnsupportedFormat) before
//! any encoder runs; encoder-level failures (e.g. jpeg over float data)
//! surface as [`Encode`](crate::error::VolumeError::Encode).

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use ndarray::ArrayViewD;
use serde::{Deserialize, Serialize};

use crate::error::VolumeError;
use crate::types::Element;

mod jpeg;
mod npz;
mod raw;

/// Generic binary content type for raw and npz payloads.
pub const CONTENT_TYPE_BINARY: &str = "application/octet-stream";

/// Content type for jpeg payloads.
pub const CONTENT_TYPE_JPEG: &str = "image/jpeg";

// =============================================================================
// DataFormat
// =============================================================================

/// Wire format of an encoded subvolume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// C-order element bytes
    Raw,
    /// npy serialization, zlib-compressed
    Npz,
    /// Lossy image encoding (uint8 only)
    Jpeg,
}

impl DataFormat {
    /// Wire name of this format, matching the serialized form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Raw => "raw",
            DataFormat::Npz => "npz",
            DataFormat::Jpeg => "jpeg",
        }
    }

    /// Content type reported alongside payloads in this format.
    pub const fn content_type(&self) -> &'static str {
        match self {
            DataFormat::Raw | DataFormat::Npz => CONTENT_TYPE_BINARY,
            DataFormat::Jpeg => CONTENT_TYPE_JPEG,
        }
    }
}

impl FromStr for DataFormat {
    type Err = VolumeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(DataFormat::Raw),
            "npz" => Ok(DataFormat::Npz),
            "jpeg" => Ok(DataFormat::Jpeg),
            other => Err(VolumeError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// EncodedSubvolume
// =============================================================================

/// Result of a subvolume extraction: encoded payload plus its content type.
#[derive(Debug, Clone)]
pub struct EncodedSubvolume {
    /// The encoded bytes
    pub data: Bytes,

    /// Content type matching the requested format
    pub content_type: &'static str,
}

// =============================================================================
// Dispatch
// =============================================================================

/// Encode an extracted block in the requested format.
///
/// The view's axes are `(z, y, x)` for single-channel blocks and
/// `(channel, z, y, x)` for multi-channel blocks, matching raw array order.
pub(crate) fn encode_subvolume<T: Element>(
    subvol: ArrayViewD<'_, T>,
    format: DataFormat,
) -> Result<EncodedSubvolume, VolumeError> {
    let data = match format {
        DataFormat::Raw => raw::encode(subvol),
        DataFormat::Npz => npz::encode(subvol)?,
        DataFormat::Jpeg => jpeg::encode(subvol)?,
    };
    Ok(EncodedSubvolume {
        data,
        content_type: format.content_type(),
    })
}

// =============================================================================
// Tests
// =============================================================================
