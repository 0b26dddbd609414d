//! Tracker plugin discovery and execution
//!
//! Plugins are discovered from:
//! 1. `.intake/plugins/` directory
//! 2. PATH (executables starting with "intake-tracker-")
//!
//! The first plugin found under a name wins.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use anyhow::{Context, Result};
use tracing::debug;

use super::protocol::{PluginManifest, PluginRequest, PluginResponse};

/// Executable name prefix of tracker plugins
pub const TRACKER_PLUGIN_PREFIX: &str = "intake-tracker-";

/// Expands a short plugin name ("jira") to its executable name
pub fn full_plugin_name(name: &str) -> String {
    if name.starts_with(TRACKER_PLUGIN_PREFIX) {
        name.to_string()
    } else {
        format!("{}{}", TRACKER_PLUGIN_PREFIX, name)
    }
}

/// Information about a discovered plugin
#[derive(Debug, Clone)]
pub struct PluginInfo {
    /// Plugin name
    pub name: String,

    /// Path to the plugin executable
    pub path: PathBuf,

    /// Plugin manifest (loaded on demand)
    pub manifest: Option<PluginManifest>,
}

/// Plugin loader and executor
pub struct PluginLoader {
    /// Discovered plugins
    plugins: HashMap<String, PluginInfo>,

    /// Additional plugin directories
    plugin_dirs: Vec<PathBuf>,

    /// Whether PATH is searched during discovery
    search_path: bool,
}

impl PluginLoader {
    /// Creates a new plugin loader
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
            plugin_dirs: Vec::new(),
            search_path: true,
        }
    }

    /// Creates a loader that only looks in explicitly added directories
    pub fn without_path() -> Self {
        Self {
            search_path: false,
            ..Self::new()
        }
    }

    /// Adds a plugin directory to search
    pub fn add_plugin_dir(&mut self, dir: impl Into<PathBuf>) {
        self.plugin_dirs.push(dir.into());
    }

    /// Discovers all available plugins
    pub fn discover(&mut self) -> Result<()> {
        self.plugins.clear();

        // Workspace plugins shadow the ones on PATH
        for dir in &self.plugin_dirs.clone() {
            self.scan_directory(dir)?;
        }

        if self.search_path {
            if let Ok(path_var) = std::env::var("PATH") {
                for dir in std::env::split_paths(&path_var) {
                    self.scan_directory(&dir)?;
                }
            }
        }

        debug!(count = self.plugins.len(), "discovered tracker plugins");
        Ok(())
    }

    /// Scans a directory for plugins
    fn scan_directory(&mut self, dir: &Path) -> Result<()> {
        if !dir.is_dir() {
            return Ok(());
        }

        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(_) => return Ok(()), // Ignore unreadable directories
        };

        for entry in entries.flatten() {
            let path = entry.path();

            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with(TRACKER_PLUGIN_PREFIX) && self.is_executable(&path) {
                    let plugin_name = name.to_string();

                    // First found wins
                    if !self.plugins.contains_key(&plugin_name) {
                        self.plugins.insert(
                            plugin_name.clone(),
                            PluginInfo {
                                name: plugin_name,
                                path,
                                manifest: None,
                            },
                        );
                    }
                }
            }
        }

        Ok(())
    }

    /// Checks if a file is executable
    fn is_executable(&self, path: &Path) -> bool {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(meta) = path.metadata() {
                return meta.is_file() && meta.permissions().mode() & 0o111 != 0;
            }
        }

        #[cfg(windows)]
        {
            if let Some(ext) = path.extension() {
                return ext == "exe" || ext == "bat" || ext == "cmd";
            }
        }

        false
    }

    /// Lists all discovered plugins, sorted by name
    pub fn list(&self) -> Vec<&PluginInfo> {
        let mut plugins: Vec<_> = self.plugins.values().collect();
        plugins.sort_by(|a, b| a.name.cmp(&b.name));
        plugins
    }

    /// Gets a plugin by name
    pub fn get(&self, name: &str) -> Option<&PluginInfo> {
        self.plugins.get(name)
    }

    /// Gets the manifest for a plugin (loads if needed)
    pub fn get_manifest(&mut self, name: &str) -> Result<Option<PluginManifest>> {
        if let Some(info) = self.plugins.get_mut(name) {
            if info.manifest.is_none() {
                info.manifest = Some(Self::load_manifest(&info.path)?);
            }
            Ok(info.manifest.clone())
        } else {
            Ok(None)
        }
    }

    /// Loads the manifest from a plugin
    fn load_manifest(path: &Path) -> Result<PluginManifest> {
        let output = Command::new(path)
            .arg("--manifest")
            .output()
            .with_context(|| format!("Failed to execute plugin: {}", path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Plugin returned error: {}", stderr);
        }

        let manifest: PluginManifest = serde_json::from_slice(&output.stdout)
            .with_context(|| "Failed to parse plugin manifest")?;

        Ok(manifest)
    }

    /// Executes a plugin request
    pub fn execute(&self, name: &str, request: &PluginRequest) -> Result<PluginResponse> {
        let info = self
            .plugins
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Plugin not found: {}", name))?;

        debug!(plugin = name, operation = %request.operation, "executing plugin request");

        let mut child = Command::new(&info.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to spawn plugin: {}", info.path.display()))?;

        let response = Self::exchange(&mut child, request);
        Self::reap(&mut child, response)
    }

    /// Writes the request and reads the single response line
    fn exchange(child: &mut Child, request: &PluginRequest) -> Result<PluginResponse> {
        // stdin is closed when dropped so the plugin sees EOF
        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| anyhow::anyhow!("Failed to open plugin stdin"))?;
            let request_json =
                serde_json::to_string(request).context("Failed to serialize request")?;
            writeln!(stdin, "{}", request_json).context("Failed to write to plugin")?;
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("Failed to open plugin stdout"))?;
        let reader = BufReader::new(stdout);

        let response_line = reader
            .lines()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No response from plugin"))?
            .context("Failed to read plugin response")?;

        serde_json::from_str(&response_line).context("Failed to parse plugin response")
    }

    /// Waits for the plugin to exit, killing it first if the exchange failed
    fn reap(child: &mut Child, response: Result<PluginResponse>) -> Result<PluginResponse> {
        if response.is_err() {
            let _ = child.kill();
        }
        if let Err(e) = child.wait() {
            debug!(error = %e, "failed to wait for plugin");
        }
        response
    }

    /// Tests plugin connectivity
    pub fn test(&self, name: &str) -> Result<bool> {
        let request = PluginRequest::new("test", serde_json::json!({}));
        let response = self.execute(name, &request)?;
        Ok(response.success)
    }
}

impl Default for PluginLoader {
    fn default() -> Self {
        Self::new()
    }
}
