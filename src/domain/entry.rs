//! Planned work item model
//!
//! An entry is one line of the plan produced upstream (usually
//! `outputs/stories.json`). Entries without a parent are epics; entries with
//! a parent are stories hanging off an epic.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of planned work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Epic,
    Story,
}

impl ItemKind {
    /// Returns the display label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Epic => "Epic",
            ItemKind::Story => "Story",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A planned work item as handed over by the planner
///
/// Fields are read leniently: `null` means absent, numbers and `true` are
/// taken as their text, and `false` or structured values are ignored. Any
/// JSON object therefore yields an entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Short title of the item
    #[serde(default, deserialize_with = "lenient_summary")]
    pub summary: String,

    /// Reference to externally stored long-form text
    #[serde(
        rename = "description",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description_ref: Option<String>,

    /// Placeholder or tracker key of the parent epic (stories only)
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<String>,

    /// Placeholder other entries may use as `parent` (epics only)
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub temp_id: Option<String>,
}

impl Entry {
    /// Creates an epic entry
    pub fn epic(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Self::default()
        }
    }

    /// Creates a story entry under the given parent reference
    pub fn story(summary: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            parent: Some(parent.into()),
            ..Self::default()
        }
    }

    /// Sets the placeholder identifier
    pub fn with_temp_id(mut self, temp_id: impl Into<String>) -> Self {
        self.temp_id = Some(temp_id.into());
        self
    }

    /// Sets the description reference
    pub fn with_description(mut self, reference: impl Into<String>) -> Self {
        self.description_ref = Some(reference.into());
        self
    }

    /// Returns the parent reference, treating blank values as absent
    pub fn parent(&self) -> Option<&str> {
        non_blank(self.parent.as_deref())
    }

    /// Returns the placeholder identifier, treating blank values as absent
    pub fn temp_id(&self) -> Option<&str> {
        non_blank(self.temp_id.as_deref())
    }

    /// Returns the description reference, treating blank values as absent
    pub fn description_ref(&self) -> Option<&str> {
        non_blank(self.description_ref.as_deref())
    }

    /// Returns the kind this entry materializes as
    pub fn kind(&self) -> ItemKind {
        if self.parent().is_some() {
            ItemKind::Story
        } else {
            ItemKind::Epic
        }
    }

    /// Returns the trimmed summary, or `fallback` when it is empty
    pub fn normalized_summary(&self, fallback: &str) -> String {
        let trimmed = self.summary.trim();
        if trimmed.is_empty() {
            fallback.to_string()
        } else {
            trimmed.to_string()
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Null | Value::Bool(false) | Value::Array(_) | Value::Object(_) => None,
    })
}

fn lenient_summary<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_text(deserializer).map(Option::unwrap_or_default)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
