//! Jpeg encoding of uint8 subvolumes.
//!
//! Jpeg is a preview format, not a data format: only uint8 blocks with one
//! or three channels encode, anything else is an [`Encode`] error. The 3-d
//! block is unrolled into a single tall image (x voxels wide, z·y voxels
//! tall), so every slice of the block lands in the output in z order.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, RgbImage};
use ndarray::ArrayViewD;

use crate::error::VolumeError;
use crate::types::{DataType, Element};

use super::DataFormat;

/// Fixed output quality (1-100).
const JPEG_QUALITY: u8 = 80;

pub(super) fn encode<T: Element>(subvol: ArrayViewD<'_, T>) -> Result<Bytes, VolumeError> {
    if T::DATA_TYPE != DataType::UInt8 {
        return Err(encode_error(format!(
            "jpeg encoding requires uint8 data, volume is {}",
            T::DATA_TYPE
        )));
    }

    let elements: Vec<T> = subvol.iter().copied().collect();
    let pixels: Vec<u8> = bytemuck::cast_slice::<T, u8>(&elements).to_vec();

    let shape = subvol.shape();
    let (channels, spatial) = match shape.len() {
        3 => (1, [shape[0], shape[1], shape[2]]),
        _ => (shape[0], [shape[1], shape[2], shape[3]]),
    };
    let width = spatial[2] as u32;
    let height = (spatial[0] * spatial[1]) as u32;

    let mut output = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY);

    match channels {
        1 => {
            let img = GrayImage::from_raw(width, height, pixels)
                .ok_or_else(|| encode_error("pixel buffer does not match block extents"))?;
            encoder
                .encode_image(&img)
                .map_err(|e| encode_error(e.to_string()))?;
        }
        3 => {
            // Channel-major planes interleave into RGB pixels.
            let plane = spatial[0] * spatial[1] * spatial[2];
            let mut interleaved = Vec::with_capacity(plane * 3);
            for i in 0..plane {
                interleaved.push(pixels[i]);
                interleaved.push(pixels[plane + i]);
                interleaved.push(pixels[2 * plane + i]);
            }
            let img = RgbImage::from_raw(width, height, interleaved)
                .ok_or_else(|| encode_error("pixel buffer does not match block extents"))?;
            encoder
                .encode_image(&img)
                .map_err(|e| encode_error(e.to_string()))?;
        }
        n => {
            return Err(encode_error(format!(
                "jpeg encoding supports 1 or 3 channels, volume has {n}"
            )));
        }
    }

    Ok(Bytes::from(output))
}

fn encode_error(reason: impl Into<String>) -> VolumeError {
    VolumeError::Encode {
        format: DataFormat::Jpeg,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, Array4};

    #[test]
    fn test_single_channel_encodes_to_valid_jpeg() {
        let arr = Array3::from_shape_fn((4, 8, 8), |(z, y, x)| ((z + y + x) * 8) as u8);
        let bytes = encode(arr.view().into_dyn()).unwrap();

        // SOI marker, then decodable with the expected unrolled dimensions
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.width(), 8);
        assert_eq!(img.height(), 32);
    }

    #[test]
    fn test_three_channels_encode_as_rgb() {
        let arr = Array4::from_shape_fn((3, 2, 4, 4), |(c, z, y, x)| ((c * 50) + z + y + x) as u8);
        let bytes = encode(arr.view().into_dyn()).unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.width(), 4);
        assert_eq!(img.height(), 8);
        assert_eq!(img.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn test_non_uint8_is_rejected() {
        let arr = Array3::<u16>::from_elem((2, 2, 2), 7);
        let err = encode(arr.view().into_dyn()).unwrap_err();
        assert!(matches!(
            err,
            VolumeError::Encode { format: DataFormat::Jpeg, .. }
        ));
    }

    #[test]
    fn test_two_channels_are_rejected() {
        let arr = Array4::<u8>::from_elem((2, 2, 2, 2), 7);
        let err = encode(arr.view().into_dyn()).unwrap_err();
        assert!(matches!(err, VolumeError::Encode { .. }));
    }
}
