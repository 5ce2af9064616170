use thiserror::Error;

use crate::encode::DataFormat;

/// Errors raised while constructing a volume store or extracting a subvolume.
#[derive(Debug, Clone, Error)]
pub enum VolumeError {
    /// Raw array has an unusable number of dimensions
    #[error("data array must be 3- or 4-dimensional, got {rank} dimension(s)")]
    InvalidRank { rank: usize },

    /// Scale list failed validation at construction
    #[error("invalid scale list: {reason}")]
    InvalidScaleList { reason: String },

    /// Advertised chunk shapes failed validation at construction
    #[error("invalid chunk data sizes: {reason}")]
    InvalidChunkSizes { reason: String },

    /// Requested scale key is not among the configured scales
    #[error("unknown scale key: {key:?}")]
    UnknownScaleKey { key: String },

    /// Requested box violates the geometry bounds of the chosen scale
    #[error("out of bounds request on axis {axis}: [{start}, {end}) violates [{lower}, {upper})")]
    OutOfBounds {
        axis: usize,
        start: i64,
        end: i64,
        lower: i64,
        upper: i64,
    },

    /// Requested wire format is not registered
    #[error("unsupported data format: {format:?}")]
    UnsupportedFormat { format: String },

    /// An encoder accepted the format but could not encode this subvolume
    #[error("{format} encoding failed: {reason}")]
    Encode { format: DataFormat, reason: String },

    /// Operation is declared but not implemented by this store
    #[error("{operation} is not supported by this volume")]
    NotSupported { operation: &'static str },
}

/// Errors raised while assembling or serializing viewer state.
#[derive(Debug, Error)]
pub enum StateError {
    /// The state document could not be serialized to JSON
    #[error("viewer state serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
