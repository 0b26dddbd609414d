//! Per-entry creation outcome

use serde::Serialize;

use super::entry::ItemKind;

/// Result of materializing one entry
///
/// Constructed only through [`Outcome::created`] and [`Outcome::failed`], so a
/// failed outcome can never carry a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    #[serde(rename = "type")]
    kind: ItemKind,
    summary: String,
    key: Option<String>,
    success: bool,
    error: Option<String>,
}

impl Outcome {
    /// Outcome for an item the tracker created
    pub fn created(kind: ItemKind, summary: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            kind,
            summary: summary.into(),
            key: Some(key.into()),
            success: true,
            error: None,
        }
    }

    /// Outcome for an item that was not created
    pub fn failed(kind: ItemKind, summary: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            kind,
            summary: summary.into(),
            key: None,
            success: false,
            error: Some(error.into()),
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Tracker key, present iff the item was created
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Diagnostic, present iff the item was not created
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Counts the successful outcomes
pub fn count_created(outcomes: &[Outcome]) -> usize {
    outcomes.iter().filter(|o| o.is_success()).count()
}
