//! End-to-end subvolume retrieval tests.

use std::io::Read;
use std::sync::Arc;

use flate2::read::ZlibDecoder;
use volstream::{
    DataFormat, Volume, VolumeError, VolumeHost, VolumeKind, VolumeOptions, VolumeRegistry,
    VolumeStore,
};

use super::test_utils::{intensity_array, label_array, rgb_array, split_npy, SequentialTokens};

fn serve_labels() -> (VolumeRegistry, volstream::Token) {
    let registry = VolumeRegistry::new("localhost:8000");
    let store = VolumeStore::new(
        label_array(16, 8, 4),
        VolumeOptions::default().with_scales(vec![1, 2]),
        &SequentialTokens::new(),
    )
    .unwrap();
    let token = store.token().clone();
    registry.register(Arc::new(store));
    (registry, token)
}

#[test]
fn test_fetch_by_token_through_registry() {
    let (registry, token) = serve_labels();

    let volume = registry.get(&token).expect("registered volume resolves");
    let sub = volume
        .subvolume(DataFormat::Raw, [0, 0, 0], [4, 8, 16], None)
        .unwrap();
    assert_eq!(sub.content_type, "application/octet-stream");
    assert_eq!(sub.data.len(), 4 * 8 * 16 * 2);
}

#[test]
fn test_raw_round_trip_is_exact() {
    let (registry, token) = serve_labels();
    let volume = registry.get(&token).unwrap();

    let sub = volume
        .subvolume(DataFormat::Raw, [1, 2, 3], [3, 4, 5], None)
        .unwrap();
    let decoded: &[u16] = bytemuck::cast_slice(&sub.data);

    // the block in C order (z,y,x), values encode their index
    let mut expected = Vec::new();
    for z in 3..5 {
        for y in 2..4 {
            for x in 1..3 {
                expected.push((z * 100 + y * 10 + x) as u16);
            }
        }
    }
    assert_eq!(decoded, &expected[..]);
}

#[test]
fn test_npz_payload_is_a_compressed_npy() {
    let (registry, token) = serve_labels();
    let volume = registry.get(&token).unwrap();

    let sub = volume
        .subvolume(DataFormat::Npz, [0, 0, 0], [2, 2, 2], None)
        .unwrap();
    assert_eq!(sub.content_type, "application/octet-stream");

    let mut npy = Vec::new();
    ZlibDecoder::new(&sub.data[..])
        .read_to_end(&mut npy)
        .expect("payload decompresses");

    let (header, data) = split_npy(&npy);
    assert!(header.contains("'descr': '<u2'"));
    assert!(header.contains("'shape': (2, 2, 2)"));

    // data section equals the raw encoding of the same box
    let raw = volume
        .subvolume(DataFormat::Raw, [0, 0, 0], [2, 2, 2], None)
        .unwrap();
    assert_eq!(data, raw.data.to_vec());
}

#[test]
fn test_jpeg_payload_has_shape_fidelity() {
    let registry = VolumeRegistry::new("localhost:8000");
    let store = VolumeStore::new(
        rgb_array(4, 8, 8),
        VolumeOptions::default().with_scales(vec![1]),
        &SequentialTokens::new(),
    )
    .unwrap();
    let token = store.token().clone();
    registry.register(Arc::new(store));

    let volume = registry.get(&token).unwrap();
    let sub = volume
        .subvolume(DataFormat::Jpeg, [0, 0, 0], [8, 8, 4], None)
        .unwrap();
    assert_eq!(sub.content_type, "image/jpeg");

    // lossy, but the unrolled dimensions must survive
    let img = image::load_from_memory(&sub.data).unwrap();
    assert_eq!(img.width(), 8);
    assert_eq!(img.height(), 4 * 8);
}

#[test]
fn test_jpeg_rejects_wide_elements() {
    let (registry, token) = serve_labels();
    let volume = registry.get(&token).unwrap();

    let err = volume
        .subvolume(DataFormat::Jpeg, [0, 0, 0], [2, 2, 2], None)
        .unwrap_err();
    assert!(matches!(err, VolumeError::Encode { .. }));
}

#[test]
fn test_downsampled_intensity_extraction_averages() {
    let store = VolumeStore::new(
        intensity_array(8, 8, 8),
        VolumeOptions::default().with_scales(vec![1, 2]),
        &SequentialTokens::new(),
    )
    .unwrap();
    assert_eq!(store.volume_kind(), VolumeKind::Image);

    let sub = store
        .subvolume(DataFormat::Raw, [0, 0, 0], [4, 4, 4], Some("2"))
        .unwrap();
    let decoded: &[f32] = bytemuck::cast_slice(&sub.data);
    assert_eq!(decoded.len(), 64);

    // box mean of the 2^3 block at the origin: mean of (z+y+x) over {0,1}^3
    assert_eq!(decoded[0], 1.5);
}

#[test]
fn test_bounds_violations_surface_per_axis() {
    let (registry, token) = serve_labels();
    let volume = registry.get(&token).unwrap();

    // scale 2 halves every extent: bounds [0,2) x [0,4) x [0,8)
    let err = volume
        .subvolume(DataFormat::Raw, [0, 0, 0], [3, 4, 8], Some("2"))
        .unwrap_err();
    assert!(matches!(
        err,
        VolumeError::OutOfBounds { axis: 0, end: 3, upper: 2, .. }
    ));

    let err = volume
        .subvolume(DataFormat::Raw, [0, 0, 9], [2, 4, 8], Some("2"))
        .unwrap_err();
    assert!(matches!(err, VolumeError::OutOfBounds { axis: 2, .. }));
}

#[test]
fn test_unknown_scale_key_fails_before_extraction() {
    let (registry, token) = serve_labels();
    let volume = registry.get(&token).unwrap();

    let err = volume
        .subvolume(DataFormat::Raw, [0, 0, 0], [1, 1, 1], Some("4"))
        .unwrap_err();
    assert!(matches!(err, VolumeError::UnknownScaleKey { key } if key == "4"));
}

#[test]
fn test_unsupported_format_name_fails_parsing() {
    let err = "tiff".parse::<DataFormat>().unwrap_err();
    assert!(matches!(
        err,
        VolumeError::UnsupportedFormat { format } if format == "tiff"
    ));
}

#[test]
fn test_info_document_through_registry() {
    let (registry, token) = serve_labels();
    let volume = registry.get(&token).unwrap();

    let info = volume.info();
    assert_eq!(info, volume.info());

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["volumeType"], "segmentation");
    assert_eq!(json["dataType"], "uint16");
    assert_eq!(json["encoding"], "npz");
    assert_eq!(json["numChannels"], 1);
    assert_eq!(json["scales"][0]["volume_key"], token.as_str());
    assert_eq!(json["scales"][0]["scale_key"], "1");
    assert_eq!(json["scales"][1]["scale_key"], "2");
    assert_eq!(
        json["scales"][0]["upperVoxelBound"],
        serde_json::json!([4, 8, 16])
    );
}

#[test]
fn test_mesh_capability_is_explicitly_unsupported() {
    let (registry, token) = serve_labels();
    let volume = registry.get(&token).unwrap();

    let err = volume.object_mesh(7).unwrap_err();
    assert!(matches!(err, VolumeError::NotSupported { .. }));
}

#[test]
fn test_concurrent_extraction_from_one_store() {
    let (registry, token) = serve_labels();
    let volume = registry.get(&token).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let volume = volume.clone();
            std::thread::spawn(move || {
                volume
                    .subvolume(DataFormat::Raw, [0, 0, 0], [4, 8, 16], None)
                    .unwrap()
                    .data
            })
        })
        .collect();

    let payloads: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for payload in &payloads[1..] {
        assert_eq!(payload, &payloads[0]);
    }
}
