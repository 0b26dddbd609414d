//! Parent references
//!
//! A story names its parent either with a placeholder declared by an epic in
//! the same plan (`temp-1`) or with a key that already exists in the tracker
//! (`JD-42`). The two cases are kept apart as a tagged value so every consumer
//! has to handle both.
//!
//! Placeholders are recognised by a fixed prefix, `temp` unless configured
//! otherwise.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Prefix used when no convention is configured
pub const DEFAULT_PLACEHOLDER_PREFIX: &str = "temp";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("Empty parent reference")]
    Empty,
}

/// Rule deciding which raw strings are placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderConvention {
    prefix: String,
}

impl PlaceholderConvention {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if `raw` follows the placeholder convention
    pub fn matches(&self, raw: &str) -> bool {
        !self.prefix.is_empty() && raw.starts_with(&self.prefix)
    }
}

impl Default for PlaceholderConvention {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_PREFIX)
    }
}

/// A parent reference, either a placeholder or a real tracker key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Reference {
    /// Placeholder declared by an epic in the same plan
    Placeholder(String),
    /// Key that already exists in the tracker
    DirectKey(String),
}

impl Reference {
    /// Classifies a raw reference under the given convention
    pub fn classify(raw: &str, convention: &PlaceholderConvention) -> Result<Self, ReferenceError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ReferenceError::Empty);
        }

        if convention.matches(raw) {
            Ok(Reference::Placeholder(raw.to_string()))
        } else {
            Ok(Reference::DirectKey(raw.to_string()))
        }
    }

    /// Returns the raw value
    pub fn as_str(&self) -> &str {
        match self {
            Reference::Placeholder(id) | Reference::DirectKey(id) => id,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Reference::Placeholder(_))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::classify(s, &PlaceholderConvention::default())
    }
}
