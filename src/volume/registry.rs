//! Volume registry: where sessions publish stores for clients to pull from.
//!
//! [`VolumeHost`] is the collaborator interface a session needs: register a
//! volume, name the externally-reachable server root. [`VolumeRegistry`] is
//! the in-memory implementation: a token-keyed map with idempotent upsert
//! semantics, safe under concurrent registration from independent sessions.
//! Transport layers look volumes up by token to serve info and subvolume
//! requests.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::token::Token;

use super::{SharedVolume, Volume};

// =============================================================================
// VolumeHost
// =============================================================================

/// Hosting collaborator a viewer session publishes volumes through.
pub trait VolumeHost: Send + Sync {
    /// Register a volume under its token.
    ///
    /// Must be idempotent: registering the same token again is a no-op,
    /// never an error, and never replaces the original registration.
    fn register(&self, volume: SharedVolume);

    /// Externally-reachable root address, e.g. `"localhost:8000"`, used to
    /// build layer `source` fields.
    fn server_url(&self) -> String;
}

// =============================================================================
// VolumeRegistry
// =============================================================================

/// In-memory token-keyed volume registry.
pub struct VolumeRegistry {
    volumes: RwLock<HashMap<Token, SharedVolume>>,
    server_url: String,
}

impl VolumeRegistry {
    /// Create a registry advertising the given server root.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            volumes: RwLock::new(HashMap::new()),
            server_url: server_url.into(),
        }
    }

    /// Look up a registered volume by token.
    pub fn get(&self, token: &Token) -> Option<SharedVolume> {
        self.volumes.read().get(token).cloned()
    }

    /// Number of registered volumes.
    pub fn len(&self) -> usize {
        self.volumes.read().len()
    }

    /// Whether no volume has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.volumes.read().is_empty()
    }
}

impl VolumeHost for VolumeRegistry {
    fn register(&self, volume: SharedVolume) {
        let token = volume.token().clone();
        let mut volumes = self.volumes.write();
        if volumes.contains_key(&token) {
            return;
        }
        debug!(%token, kind = %volume.volume_kind(), "registered volume");
        volumes.insert(token, volume);
    }

    fn server_url(&self) -> String {
        self.server_url.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
