//! Volume tokens and token generation.
//!
//! Every volume store is addressed externally by an opaque [`Token`] assigned
//! at construction. Generation goes through the [`TokenSource`] trait so that
//! callers can inject a deterministic source in tests; the default
//! [`UuidTokenSource`] draws random UUID v4 hex strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Token
// =============================================================================

/// Opaque unique identifier addressing a volume store externally.
///
/// Immutable after construction; used as the registry key and embedded in
/// layer `source` URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Wrap an existing identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// =============================================================================
// TokenSource
// =============================================================================

/// Generator of fresh volume tokens.
///
/// Implementations must hand out a distinct token per call within one
/// process. Inject a fixed-sequence implementation in tests to make token
/// assignment deterministic.
pub trait TokenSource: Send + Sync {
    /// Draw the next token.
    fn next_token(&self) -> Token;
}

/// Default token source backed by random UUID v4, rendered as 32 hex digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidTokenSource;

impl TokenSource for UuidTokenSource {
    fn next_token(&self) -> Token {
        Token(Uuid::new_v4().simple().to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================
