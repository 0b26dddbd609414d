//! Tracker plugin protocol types
//!
//! Plugins communicate via JSON messages over stdin/stdout, one line each way.
//! Each plugin must support the `--manifest` flag to declare capabilities.

use serde::{Deserialize, Serialize};

/// Operations every tracker plugin is expected to understand
pub const TRACKER_OPERATIONS: &[&str] = &[
    "test",
    "create_issue",
    "comment",
    "add_label",
    "remove_label",
    "assign",
    "transition",
    "labels",
    "search",
];

/// Plugin manifest declaring capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Plugin name (e.g., "intake-tracker-jira")
    pub name: String,

    /// Plugin version
    pub version: String,

    /// Human-readable description
    pub description: String,

    /// Plugin type
    #[serde(rename = "type")]
    pub plugin_type: PluginType,

    /// Supported operations
    pub operations: Vec<String>,
}

impl PluginManifest {
    /// Returns the required operations this plugin does not declare
    pub fn missing_operations(&self) -> Vec<&'static str> {
        TRACKER_OPERATIONS
            .iter()
            .copied()
            .filter(|op| !self.operations.iter().any(|declared| declared == op))
            .collect()
    }
}

/// Type of plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginType {
    /// Issue tracker backend (Jira, GitHub, ...)
    Tracker,
}

/// A message sent to a plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginRequest {
    /// The operation to perform
    pub operation: String,

    /// Operation-specific parameters
    pub params: serde_json::Value,
}

impl PluginRequest {
    pub fn new(operation: impl Into<String>, params: impl Into<serde_json::Value>) -> Self {
        Self {
            operation: operation.into(),
            params: params.into(),
        }
    }
}

/// A response from a plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginResponse {
    /// Whether the operation succeeded
    pub success: bool,

    /// Result data (if success)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Error message (if failure)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PluginResponse {
    pub fn success(data: impl Into<serde_json::Value>) -> Self {
        Self {
            success: true,
            data: Some(data.into()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}
