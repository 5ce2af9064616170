//! Test utilities for integration tests.
//!
//! Shared token sources, array builders, and payload parsing helpers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ndarray::{Array3, Array4, ArrayD};
use volstream::{Token, TokenSource};

/// Deterministic token source: `vol-0`, `vol-1`, ...
pub struct SequentialTokens(AtomicUsize);

impl SequentialTokens {
    pub fn new() -> Self {
        Self(AtomicUsize::new(0))
    }
}

impl TokenSource for SequentialTokens {
    fn next_token(&self) -> Token {
        Token::new(format!("vol-{}", self.0.fetch_add(1, Ordering::SeqCst)))
    }
}

/// A u16 label volume whose values encode their z,y,x index.
pub fn label_array(d: usize, h: usize, w: usize) -> Arc<ArrayD<u16>> {
    let data = Array3::from_shape_fn((d, h, w), |(z, y, x)| (z * 100 + y * 10 + x) as u16);
    Arc::new(data.into_dyn())
}

/// An f32 intensity volume with a smooth gradient.
pub fn intensity_array(d: usize, h: usize, w: usize) -> Arc<ArrayD<f32>> {
    let data = Array3::from_shape_fn((d, h, w), |(z, y, x)| (z + y + x) as f32);
    Arc::new(data.into_dyn())
}

/// A 3-channel u8 volume, one constant plane per channel.
pub fn rgb_array(d: usize, h: usize, w: usize) -> Arc<ArrayD<u8>> {
    let data = Array4::from_shape_fn((3, d, h, w), |(c, _, _, _)| (c * 80) as u8);
    Arc::new(data.into_dyn())
}

/// Split a decompressed npy stream into (header, data bytes).
pub fn split_npy(bytes: &[u8]) -> (String, Vec<u8>) {
    assert_eq!(&bytes[..8], b"\x93NUMPY\x01\x00", "npy magic/version");
    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let header = std::str::from_utf8(&bytes[10..10 + header_len])
        .unwrap()
        .to_string();
    (header, bytes[10 + header_len..].to_vec())
}
