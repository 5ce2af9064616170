//! Viewer sessions: ordered layer collections and their state documents.
//!
//! A session collects layers in insertion order, registers every backing
//! volume with a [`VolumeHost`] when state is built, resolves collision-free
//! display names, and serializes the aggregate into a compact, percent-
//! encoded document that fits in a URL fragment.

use std::collections::HashSet;
use std::sync::Arc;

use ndarray::ArrayD;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{StateError, VolumeError};
use crate::token::{TokenSource, UuidTokenSource};
use crate::types::Element;
use crate::volume::{Volume, VolumeHost};

use super::layer::{Layer, LayerOptions, LayerSpec, SpatialAttributes};

/// Characters left untouched by state encoding: URL-unreserved characters
/// plus the fragment-safe punctuation viewer clients expect to survive.
const STATE_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'@')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'!')
    .remove(b'+')
    .remove(b'=')
    .remove(b':')
    .remove(b';')
    .remove(b',')
    .remove(b'?')
    .remove(b'/')
    .remove(b'\'');

// =============================================================================
// ViewerState
// =============================================================================

/// The assembled state document: display names mapped to layer specs,
/// first-seen order preserved.
#[derive(Debug, Clone)]
pub struct ViewerState {
    layers: Vec<(String, LayerSpec)>,
}

impl ViewerState {
    /// Layer entries in serialization order.
    pub fn layers(&self) -> impl Iterator<Item = (&str, &LayerSpec)> {
        self.layers.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Look up a layer spec by display name.
    pub fn get(&self, name: &str) -> Option<&LayerSpec> {
        self.layers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, spec)| spec)
    }

    /// Number of named layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the document names no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Serialize for ViewerState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct OrderedLayers<'a>(&'a [(String, LayerSpec)]);

        impl Serialize for OrderedLayers<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (name, spec) in self.0 {
                    map.serialize_entry(name, spec)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("layers", &OrderedLayers(&self.layers))?;
        map.end()
    }
}

// =============================================================================
// ViewerSession
// =============================================================================

/// An ordered collection of layers plus session-wide defaults.
pub struct ViewerSession {
    layers: Vec<Layer>,
    voxel_size: [f64; 3],
    tokens: Arc<dyn TokenSource>,
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerSession {
    /// Create a session with unit default voxel size and random tokens.
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            voxel_size: [1.0; 3],
            tokens: Arc::new(UuidTokenSource),
        }
    }

    /// Create a session with a custom default voxel size.
    pub fn with_voxel_size(voxel_size: [f64; 3]) -> Self {
        Self {
            voxel_size,
            ..Self::new()
        }
    }

    /// Replace the token source handed to layers this session constructs.
    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Append a layer built from raw data.
    pub fn add<T: Element>(
        &mut self,
        data: Arc<ArrayD<T>>,
        options: LayerOptions,
    ) -> Result<(), VolumeError> {
        let layer = Layer::new(data, None, options, self.voxel_size, self.tokens.as_ref())?;
        self.layers.push(layer);
        Ok(())
    }

    /// Append a layer built from raw data carrying placement attributes.
    pub fn add_with_attributes<T: Element>(
        &mut self,
        data: Arc<ArrayD<T>>,
        attrs: &dyn SpatialAttributes,
        options: LayerOptions,
    ) -> Result<(), VolumeError> {
        let layer = Layer::new(
            data,
            Some(attrs),
            options,
            self.voxel_size,
            self.tokens.as_ref(),
        )?;
        self.layers.push(layer);
        Ok(())
    }

    /// Append an already-built layer.
    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// The session's layers in insertion order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Build the state document, registering every volume with `host`.
    ///
    /// Display names: an explicit layer name is used verbatim; unnamed
    /// layers start from their volume kind and take the smallest integer
    /// suffix (2, 3, ...) not already in use. Every explicit name is
    /// reserved before the pass, so an unnamed layer never claims a name an
    /// explicitly-named later layer holds, and resolution is deterministic
    /// regardless of layer order. A repeated explicit name replaces the
    /// earlier spec but keeps its first-seen position.
    pub fn state(&self, host: &dyn VolumeHost) -> ViewerState {
        let mut used: HashSet<String> = self
            .layers
            .iter()
            .filter_map(|layer| layer.name().map(str::to_string))
            .collect();

        let mut entries: Vec<(String, LayerSpec)> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            host.register(Arc::clone(layer.volume()));

            let name = match layer.name() {
                Some(name) => name.to_string(),
                None => {
                    let base = layer.volume().volume_kind().as_str();
                    let mut candidate = base.to_string();
                    let mut suffix = 2u32;
                    while used.contains(&candidate) {
                        candidate = format!("{base}{suffix}");
                        suffix += 1;
                    }
                    used.insert(candidate.clone());
                    candidate
                }
            };

            let spec = layer.layer_spec(&host.server_url());
            match entries.iter_mut().find(|(existing, _)| *existing == name) {
                Some(entry) => entry.1 = spec,
                None => entries.push((name, spec)),
            }
        }

        ViewerState { layers: entries }
    }

    /// Serialize the state document for embedding in a URL fragment.
    ///
    /// Compact JSON (no extraneous whitespace), percent-encoded over
    /// [`STATE_SAFE`]'s complement. Deterministic for unchanged layers.
    pub fn encoded_state(&self, host: &dyn VolumeHost) -> Result<String, StateError> {
        let json = serde_json::to_string(&self.state(host))?;
        Ok(utf8_percent_encode(&json, STATE_SAFE).to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================
