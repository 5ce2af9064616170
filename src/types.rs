//! Array element types.
//!
//! Volumes are generic over their element type. [`DataType`] is the closed
//! set of supported types with their numpy-style wire names (the names the
//! viewer client understands, e.g. `"uint16"`), and [`Element`] is the marker
//! trait binding a Rust primitive to its `DataType`.

use bytemuck::Pod;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// DataType
// =============================================================================

/// Element type of a served volume.
///
/// Serialized with numpy-style names (`"uint8"`, `"float32"`, ...), which is
/// what the info document advertises to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Unsigned 8-bit integer
    UInt8,
    /// Unsigned 16-bit integer
    UInt16,
    /// Unsigned 32-bit integer
    UInt32,
    /// Unsigned 64-bit integer
    UInt64,
    /// Signed 8-bit integer
    Int8,
    /// Signed 16-bit integer
    Int16,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// 32-bit floating point
    Float32,
    /// 64-bit floating point
    Float64,
}

impl DataType {
    /// Wire name of this type, matching the serialized form.
    pub const fn name(&self) -> &'static str {
        match self {
            DataType::UInt8 => "uint8",
            DataType::UInt16 => "uint16",
            DataType::UInt32 => "uint32",
            DataType::UInt64 => "uint64",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
        }
    }

    /// Size in bytes of one element.
    pub const fn size_in_bytes(&self) -> usize {
        match self {
            DataType::UInt8 | DataType::Int8 => 1,
            DataType::UInt16 | DataType::Int16 => 2,
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => 4,
            DataType::UInt64 | DataType::Int64 | DataType::Float64 => 8,
        }
    }

    /// Whether this is an unsigned integer type.
    pub const fn is_unsigned(&self) -> bool {
        matches!(
            self,
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64
        )
    }

    /// npy dtype descriptor for this type (little-endian).
    pub(crate) const fn npy_descr(&self) -> &'static str {
        match self {
            DataType::UInt8 => "|u1",
            DataType::UInt16 => "<u2",
            DataType::UInt32 => "<u4",
            DataType::UInt64 => "<u8",
            DataType::Int8 => "|i1",
            DataType::Int16 => "<i2",
            DataType::Int32 => "<i4",
            DataType::Int64 => "<i8",
            DataType::Float32 => "<f4",
            DataType::Float64 => "<f8",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Element
// =============================================================================

/// Marker trait binding a Rust primitive to its [`DataType`].
///
/// The `Pod` bound gives safe element-to-byte casts for the raw and npz
/// encoders; the f64 conversions exist for resampling arithmetic.
pub trait Element: Pod + PartialEq + Send + Sync + 'static {
    /// The wire-level type of this element.
    const DATA_TYPE: DataType;

    /// Widen to f64 for accumulation.
    fn to_f64(self) -> f64;

    /// Narrow from f64, saturating on overflow per `as`-cast semantics.
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty => $dt:expr),* $(,)?) => {
        $(
            impl Element for $ty {
                const DATA_TYPE: DataType = $dt;

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

impl_element! {
    u8 => DataType::UInt8,
    u16 => DataType::UInt16,
    u32 => DataType::UInt32,
    u64 => DataType::UInt64,
    i8 => DataType::Int8,
    i16 => DataType::Int16,
    i32 => DataType::Int32,
    i64 => DataType::Int64,
    f32 => DataType::Float32,
    f64 => DataType::Float64,
}

// =============================================================================
// Tests
// =============================================================================
