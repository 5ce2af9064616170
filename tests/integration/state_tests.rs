//! End-to-end viewer state tests.

use std::sync::Arc;

use percent_encoding::percent_decode_str;
use volstream::{LayerOptions, SpatialAttributes, ViewerSession, Volume, VolumeRegistry};

use super::test_utils::{intensity_array, label_array, rgb_array, SequentialTokens};

fn session() -> ViewerSession {
    ViewerSession::new().with_token_source(Arc::new(SequentialTokens::new()))
}

#[test]
fn test_default_naming_is_stable_across_insertion_orders() {
    // two images and a segmentation, in two different orders
    let mut forward = session();
    forward
        .add(intensity_array(4, 4, 4), LayerOptions::default())
        .unwrap();
    forward
        .add(intensity_array(4, 4, 4), LayerOptions::default())
        .unwrap();
    forward
        .add(label_array(4, 4, 4), LayerOptions::default())
        .unwrap();

    let mut reversed = session();
    reversed
        .add(label_array(4, 4, 4), LayerOptions::default())
        .unwrap();
    reversed
        .add(intensity_array(4, 4, 4), LayerOptions::default())
        .unwrap();
    reversed
        .add(intensity_array(4, 4, 4), LayerOptions::default())
        .unwrap();

    let registry = VolumeRegistry::new("localhost:8000");
    let forward_names: Vec<String> = forward
        .state(&registry)
        .layers()
        .map(|(name, _)| name.to_string())
        .collect();
    let reversed_names: Vec<String> = reversed
        .state(&registry)
        .layers()
        .map(|(name, _)| name.to_string())
        .collect();

    assert_eq!(forward_names, vec!["image", "image2", "segmentation"]);
    assert_eq!(reversed_names, vec!["segmentation", "image", "image2"]);
}

#[test]
fn test_state_document_shape() {
    let mut session = session();
    session
        .add(
            rgb_array(2, 4, 4),
            LayerOptions::default()
                .with_name("em")
                .with_shader("emitRGB(vec3(1.0,0.0,0.0));")
                .with_visible(false),
        )
        .unwrap();
    session
        .add(label_array(4, 4, 4), LayerOptions::default())
        .unwrap();

    let registry = VolumeRegistry::new("localhost:8000");
    let json = serde_json::to_value(session.state(&registry)).unwrap();

    let em = &json["layers"]["em"];
    assert_eq!(em["type"], "image");
    assert_eq!(em["source"], "python://localhost:8000/vol-0");
    assert_eq!(em["shader"], "emitRGB(vec3(1.0,0.0,0.0));");
    assert_eq!(em["visible"], false);

    let labels = &json["layers"]["segmentation"];
    assert_eq!(labels["type"], "segmentation");
    assert_eq!(labels["source"], "python://localhost:8000/vol-1");
    // options never supplied stay absent, not false
    assert!(labels.get("shader").is_none());
    assert!(labels.get("visible").is_none());
}

#[test]
fn test_encoded_state_round_trips_through_percent_decoding() {
    let mut session = session();
    session
        .add(label_array(4, 4, 4), LayerOptions::default())
        .unwrap();
    session
        .add(intensity_array(4, 4, 4), LayerOptions::default())
        .unwrap();

    let registry = VolumeRegistry::new("localhost:8000");
    let encoded = session.encoded_state(&registry).unwrap();

    // every byte is either percent-escaped or in the safe set
    assert!(encoded
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "%-_.~@#$&()*!+=:;,.?/'".contains(c)));

    let decoded = percent_decode_str(&encoded).decode_utf8().unwrap();
    let value: serde_json::Value = serde_json::from_str(&decoded).unwrap();
    assert_eq!(
        value["layers"]["segmentation"]["source"],
        "python://localhost:8000/vol-0"
    );
    assert_eq!(value["layers"]["image"]["type"], "image");

    // compact separators: no whitespace anywhere in the document
    assert!(!decoded.contains(' '));
}

#[test]
fn test_encoding_registers_volumes_idempotently() {
    let mut session = session();
    session
        .add(label_array(4, 4, 4), LayerOptions::default())
        .unwrap();

    let registry = VolumeRegistry::new("localhost:8000");
    let first = session.encoded_state(&registry).unwrap();
    let second = session.encoded_state(&registry).unwrap();

    assert_eq!(first, second);
    assert_eq!(registry.len(), 1);

    // the registered volume is the one the state points at
    let token = volstream::Token::new("vol-0");
    let volume = registry.get(&token).expect("state source resolves");
    assert_eq!(volume.token(), &token);
}

#[test]
fn test_attribute_carrying_sources_place_their_layers() {
    struct Attrs;

    impl SpatialAttributes for Attrs {
        fn resolution(&self) -> Option<[f64; 3]> {
            Some([30.0, 6.0, 6.0]) // stored z,y,x
        }

        fn offset(&self) -> Option<[i64; 3]> {
            Some([512, 0, 0])
        }
    }

    let mut session = session();
    session
        .add_with_attributes(label_array(4, 4, 4), &Attrs, LayerOptions::default())
        .unwrap();

    let registry = VolumeRegistry::new("localhost:8000");
    session.state(&registry);

    let volume = registry.get(&volstream::Token::new("vol-0")).unwrap();
    let info = volume.info();
    assert_eq!(info.scales[0].lower_voxel_bound, [0, 0, 512]);
    assert_eq!(info.scales[0].voxel_size, [6.0, 6.0, 30.0]);
}
