//! Placeholder resolution
//!
//! The resolver lives for exactly one intake run. Pass 1 registers the key of
//! every epic that declared a placeholder; pass 2 only reads from it.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use super::reference::Reference;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Could not resolve parent placeholder \"{0}\"")]
    UnresolvedPlaceholder(String),

    #[error("Parent key \"{0}\" is not known to this run")]
    UnknownKey(String),
}

/// How direct tracker keys used as parents are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectKeyPolicy {
    /// Hand the key to the tracker unchanged
    #[default]
    PassThrough,
    /// Only accept keys created in this run or present in the tracker snapshot
    RequireKnown,
}

/// How repeated placeholders across epics are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Refuse the plan before anything is created
    #[default]
    Reject,
    /// Later registrations overwrite earlier ones
    LastWins,
}

/// Run-scoped mapping from placeholder to tracker key
#[derive(Debug, Clone, Default)]
pub struct IdResolver {
    placeholders: HashMap<String, String>,
    known_keys: HashSet<String>,
    policy: DirectKeyPolicy,
}

impl IdResolver {
    /// Creates an empty resolver that passes direct keys through
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty resolver with the given direct key policy
    pub fn with_policy(policy: DirectKeyPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Seeds keys that already exist in the tracker
    pub fn with_known_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn policy(&self) -> DirectKeyPolicy {
        self.policy
    }

    /// Maps a placeholder to the key the tracker assigned
    ///
    /// Returns the key previously registered for the same placeholder, if any.
    pub fn register(
        &mut self,
        placeholder: impl Into<String>,
        tracker_key: impl Into<String>,
    ) -> Option<String> {
        let tracker_key = tracker_key.into();
        self.known_keys.insert(tracker_key.clone());
        self.placeholders.insert(placeholder.into(), tracker_key)
    }

    /// Resolves a parent reference to a tracker key
    pub fn resolve(&self, reference: &Reference) -> Result<String, ResolveError> {
        match reference {
            Reference::Placeholder(id) => self
                .placeholders
                .get(id)
                .cloned()
                .ok_or_else(|| ResolveError::UnresolvedPlaceholder(id.clone())),
            Reference::DirectKey(key) => match self.policy {
                DirectKeyPolicy::PassThrough => Ok(key.clone()),
                DirectKeyPolicy::RequireKnown if self.known_keys.contains(key) => Ok(key.clone()),
                DirectKeyPolicy::RequireKnown => Err(ResolveError::UnknownKey(key.clone())),
            },
        }
    }

    /// Number of registered placeholders
    pub fn len(&self) -> usize {
        self.placeholders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placeholders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder(id: &str) -> Reference {
        Reference::Placeholder(id.to_string())
    }

    fn direct(key: &str) -> Reference {
        Reference::DirectKey(key.to_string())
    }

    #[test]
    fn resolves_registered_placeholder() {
        let mut resolver = IdResolver::new();
        resolver.register("temp-1", "JD-10");

        assert_eq!(resolver.resolve(&placeholder("temp-1")), Ok("JD-10".to_string()));
    }

    #[test]
    fn unregistered_placeholder_fails() {
        let resolver = IdResolver::new();

        assert_eq!(
            resolver.resolve(&placeholder("temp-9")),
            Err(ResolveError::UnresolvedPlaceholder("temp-9".to_string()))
        );
    }

    #[test]
    fn unresolved_failure_does_not_depend_on_other_registrations() {
        let empty = IdResolver::new();
        let mut busy = IdResolver::new();
        for i in 0..20 {
            busy.register(format!("temp-{}", i), format!("JD-{}", i));
        }

        assert_eq!(
            empty.resolve(&placeholder("temp-missing")),
            busy.resolve(&placeholder("temp-missing"))
        );
    }

    #[test]
    fn register_overwrites_and_returns_previous() {
        let mut resolver = IdResolver::new();

        assert_eq!(resolver.register("temp-1", "JD-1"), None);
        assert_eq!(resolver.register("temp-1", "JD-2"), Some("JD-1".to_string()));
        assert_eq!(resolver.resolve(&placeholder("temp-1")), Ok("JD-2".to_string()));
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn direct_keys_pass_through_by_default() {
        let resolver = IdResolver::new();
        assert_eq!(resolver.resolve(&direct("JD-99")), Ok("JD-99".to_string()));
    }

    #[test]
    fn require_known_rejects_unknown_direct_keys() {
        let resolver = IdResolver::with_policy(DirectKeyPolicy::RequireKnown);

        assert_eq!(
            resolver.resolve(&direct("JD-99")),
            Err(ResolveError::UnknownKey("JD-99".to_string()))
        );
    }

    #[test]
    fn require_known_accepts_seeded_and_created_keys() {
        let mut resolver =
            IdResolver::with_policy(DirectKeyPolicy::RequireKnown).with_known_keys(["JD-3"]);
        resolver.register("temp-1", "JD-11");

        assert_eq!(resolver.resolve(&direct("JD-3")), Ok("JD-3".to_string()));
        assert_eq!(resolver.resolve(&direct("JD-11")), Ok("JD-11".to_string()));
    }

    #[test]
    fn resolve_error_mentions_placeholder() {
        let err = ResolveError::UnresolvedPlaceholder("temp-1".to_string());
        assert_eq!(err.to_string(), "Could not resolve parent placeholder \"temp-1\"");
    }

    #[test]
    fn policies_parse_from_config_strings() {
        #[derive(Deserialize)]
        struct Policies {
            duplicates: DuplicatePolicy,
            direct_keys: DirectKeyPolicy,
        }

        let parsed: Policies =
            toml::from_str("duplicates = \"last_wins\"\ndirect_keys = \"require_known\"").unwrap();

        assert_eq!(parsed.duplicates, DuplicatePolicy::LastWins);
        assert_eq!(parsed.direct_keys, DirectKeyPolicy::RequireKnown);
    }
}
