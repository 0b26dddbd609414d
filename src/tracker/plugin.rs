//! Tracker backed by an external plugin binary

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::loader::{full_plugin_name, PluginLoader};
use super::protocol::PluginRequest;
use super::{IssueCreator, IssueSummary, SearchQuery, Tracker, TrackerError};
use crate::domain::ItemKind;

/// Tracker-side issue type names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueTypes {
    pub epic: String,
    pub story: String,
}

impl IssueTypes {
    pub fn name(&self, kind: ItemKind) -> &str {
        match kind {
            ItemKind::Epic => &self.epic,
            ItemKind::Story => &self.story,
        }
    }
}

impl Default for IssueTypes {
    fn default() -> Self {
        Self {
            epic: "Epic".to_string(),
            story: "Story".to_string(),
        }
    }
}

/// [`Tracker`] that forwards every call to an `intake-tracker-*` plugin
pub struct PluginTracker {
    loader: PluginLoader,
    plugin_name: String,
    issue_types: IssueTypes,
}

impl PluginTracker {
    /// Wraps a discovered plugin
    pub fn open(loader: PluginLoader, plugin: &str, issue_types: IssueTypes) -> Result<Self> {
        let plugin_name = full_plugin_name(plugin);

        if loader.get(&plugin_name).is_none() {
            anyhow::bail!(
                "Tracker plugin not found: {}. Install it or check 'intake tracker list'.",
                plugin_name
            );
        }

        Ok(Self {
            loader,
            plugin_name,
            issue_types,
        })
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    fn call(&self, operation: &str, params: Value) -> Result<Option<Value>, TrackerError> {
        let request = PluginRequest::new(operation, params);
        let response = self
            .loader
            .execute(&self.plugin_name, &request)
            .map_err(|e| TrackerError::Plugin(format!("{:#}", e)))?;

        if !response.success {
            return Err(TrackerError::rejected(
                operation,
                response
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        Ok(response.data)
    }

    fn create_issue(
        &self,
        kind: ItemKind,
        project: &str,
        summary: &str,
        description: &str,
        parent_key: Option<&str>,
    ) -> Result<String, TrackerError> {
        let mut params = json!({
            "project": project,
            "issue_type": self.issue_types.name(kind),
            "summary": summary,
            "description": description,
        });
        if let Some(parent) = parent_key {
            params["parent_key"] = json!(parent);
        }

        let data = self.call("create_issue", params)?;
        extract_key(data.as_ref()).ok_or_else(|| TrackerError::MissingKey("create_issue".into()))
    }
}

/// Pulls the issue key out of a creation response
///
/// Accepts a bare string or an object with a `key` field.
fn extract_key(data: Option<&Value>) -> Option<String> {
    let key = match data? {
        Value::String(key) => key.as_str(),
        Value::Object(map) => map.get("key")?.as_str()?,
        _ => return None,
    };

    let key = key.trim();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

impl IssueCreator for PluginTracker {
    fn create_epic(
        &mut self,
        project: &str,
        summary: &str,
        description: &str,
    ) -> Result<String, TrackerError> {
        self.create_issue(ItemKind::Epic, project, summary, description, None)
    }

    fn create_story(
        &mut self,
        project: &str,
        summary: &str,
        description: &str,
        parent_key: &str,
    ) -> Result<String, TrackerError> {
        self.create_issue(ItemKind::Story, project, summary, description, Some(parent_key))
    }
}

impl Tracker for PluginTracker {
    fn post_comment(&mut self, key: &str, text: &str) -> Result<(), TrackerError> {
        self.call("comment", json!({ "key": key, "comment": text }))
            .map(|_| ())
    }

    fn add_label(&mut self, key: &str, label: &str) -> Result<(), TrackerError> {
        self.call("add_label", json!({ "key": key, "label": label }))
            .map(|_| ())
    }

    fn remove_label(&mut self, key: &str, label: &str) -> Result<(), TrackerError> {
        self.call("remove_label", json!({ "key": key, "label": label }))
            .map(|_| ())
    }

    fn assign(&mut self, key: &str, account_id: &str) -> Result<(), TrackerError> {
        self.call("assign", json!({ "key": key, "account_id": account_id }))
            .map(|_| ())
    }

    fn transition(&mut self, key: &str, status: &str) -> Result<(), TrackerError> {
        self.call("transition", json!({ "key": key, "status": status }))
            .map(|_| ())
    }

    fn labels(&mut self, key: &str) -> Result<Vec<String>, TrackerError> {
        let data = self.call("labels", json!({ "key": key }))?;
        let labels = data
            .as_ref()
            .and_then(|d| d.get("labels"))
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));

        serde_json::from_value(labels).map_err(|e| TrackerError::InvalidResponse {
            operation: "labels".to_string(),
            message: e.to_string(),
        })
    }

    fn search(&mut self, query: &SearchQuery) -> Result<Vec<IssueSummary>, TrackerError> {
        let data = self.call(
            "search",
            json!({
                "project": query.project,
                "issue_type": self.issue_types.name(query.kind),
                "exclude": query.exclude,
            }),
        )?;
        let issues = data
            .as_ref()
            .and_then(|d| d.get("issues"))
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));

        serde_json::from_value(issues).map_err(|e| TrackerError::InvalidResponse {
            operation: "search".to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_key_from_object() {
        let data = json!({"key": "JD-12", "id": "10042"});
        assert_eq!(extract_key(Some(&data)), Some("JD-12".to_string()));
    }

    #[test]
    fn extracts_key_from_bare_string() {
        let data = json!("JD-13");
        assert_eq!(extract_key(Some(&data)), Some("JD-13".to_string()));
    }

    #[test]
    fn missing_or_blank_key_is_none() {
        assert_eq!(extract_key(None), None);
        assert_eq!(extract_key(Some(&json!({"id": "1"}))), None);
        assert_eq!(extract_key(Some(&json!({"key": "  "}))), None);
        assert_eq!(extract_key(Some(&json!(42))), None);
    }

    #[test]
    fn issue_type_names() {
        let types = IssueTypes::default();
        assert_eq!(types.name(ItemKind::Epic), "Epic");
        assert_eq!(types.name(ItemKind::Story), "Story");
    }

    #[test]
    fn open_requires_discovered_plugin() {
        let loader = PluginLoader::without_path();
        let result = PluginTracker::open(loader, "jira", IssueTypes::default());

        let err = result.err().unwrap();
        assert!(err.to_string().contains("intake-tracker-jira"));
    }
}
