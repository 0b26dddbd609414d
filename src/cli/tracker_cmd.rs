//! Tracker plugin commands

use anyhow::Result;
use clap::Subcommand;
use std::process::ExitCode;
use tracing::debug;

use super::output::Output;
use crate::storage::Workspace;
use crate::tracker::{full_plugin_name, DryRunTracker, PluginLoader, PluginTracker, Tracker};

#[derive(Subcommand)]
pub enum TrackerCommands {
    /// List available tracker plugins
    List,

    /// Test tracker plugin connectivity
    Test {
        /// Plugin name (with or without the intake-tracker- prefix)
        name: String,
    },
}

pub fn run(cmd: TrackerCommands, output: &Output) -> Result<ExitCode> {
    match cmd {
        TrackerCommands::List => list_plugins(output),
        TrackerCommands::Test { name } => test_plugin(output, &name),
    }
}

/// Discovers plugins on PATH and in the workspace's plugin directory
pub(super) fn discover(workspace: Option<&Workspace>) -> Result<PluginLoader> {
    let mut loader = PluginLoader::new();

    if let Some(workspace) = workspace {
        loader.add_plugin_dir(workspace.plugins_dir());
    }

    loader.discover()?;
    debug!("Discovered {} tracker plugin(s)", loader.list().len());
    Ok(loader)
}

/// Opens the configured tracker, or a dry-run stand-in
pub(super) fn open_tracker(workspace: &Workspace, dry_run: bool) -> Result<Box<dyn Tracker>> {
    if dry_run {
        debug!("Using dry-run tracker");
        return Ok(Box::new(DryRunTracker::new()));
    }

    let settings = workspace.settings();
    let loader = discover(Some(workspace))?;
    let tracker = PluginTracker::open(loader, &settings.tracker.plugin, settings.issue_types.clone())?;
    debug!("Using tracker plugin {}", tracker.plugin_name());
    Ok(Box::new(tracker))
}

fn list_plugins(output: &Output) -> Result<ExitCode> {
    let workspace = Workspace::open_current().ok();
    let loader = discover(workspace.as_ref())?;

    let plugins = loader.list();

    if output.is_json() {
        let items: Vec<_> = plugins
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.name,
                    "path": p.path.display().to_string(),
                })
            })
            .collect();
        output.data(&items);
    } else if plugins.is_empty() {
        println!("No tracker plugins found.");
        println!();
        println!("Tracker plugins are discovered from:");
        println!("  - .intake/plugins/ directory");
        println!("  - PATH (executables starting with 'intake-tracker-')");
    } else {
        println!("Available tracker plugins:");
        println!("{:<30} PATH", "NAME");
        println!("{}", "-".repeat(70));
        for plugin in plugins {
            println!("{:<30} {}", plugin.name, plugin.path.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn test_plugin(output: &Output, name: &str) -> Result<ExitCode> {
    let workspace = Workspace::open_current().ok();
    let mut loader = discover(workspace.as_ref())?;
    let name = full_plugin_name(name);

    if loader.get(&name).is_none() {
        anyhow::bail!("Tracker plugin not found: {}", name);
    }

    let manifest = loader.get_manifest(&name)?;
    let test_result = loader.test(&name);
    let passed = matches!(test_result, Ok(true));

    if output.is_json() {
        output.data(&serde_json::json!({
            "name": name,
            "manifest": manifest,
            "missing_operations": manifest.as_ref().map(|m| m.missing_operations()),
            "test_success": passed,
            "test_error": test_result.as_ref().err().map(|e| format!("{:#}", e)),
        }));
    } else {
        if let Some(manifest) = &manifest {
            println!("Plugin: {}", manifest.name);
            println!("Version: {}", manifest.version);
            println!("Description: {}", manifest.description);
            println!("Operations: {}", manifest.operations.join(", "));

            let missing = manifest.missing_operations();
            if !missing.is_empty() {
                println!("Missing operations: {}", missing.join(", "));
            }
            output.blank();
        }

        match &test_result {
            Ok(true) => output.success(&format!("Tracker '{}' is working correctly", name)),
            Ok(false) => output.error(&format!("Tracker '{}' test returned false", name)),
            Err(e) => output.error(&format!("Tracker '{}' test failed: {:#}", name, e)),
        }
    }

    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
